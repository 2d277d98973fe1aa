use std::io::Write;

use anyhow::Result;
use rewind_host::{ContainerConfig, TimeTravel};
use rewind_value::{Value, ValueProducer};
use serde_json::json;

use crate::script::{Container, mutate, patch, print_history};

fn todos() -> Container {
    TimeTravel::new(
        Value::from(json!([{ "id": 0, "value": "foo" }, { "id": 1, "value": "bar" }])),
        ValueProducer,
        ContainerConfig::with_mutation_detection(true),
    )
}

fn set_value(tt: &mut Container, index: usize, text: &str) -> Result<()> {
    patch(tt, &format!("{index}.value"), Value::from(text), true)
}

/// Run the built-in walkthroughs, printing state after each one.
pub fn run(out: &mut impl Write) -> Result<()> {
    writeln!(out, "== divergent rewrite")?;
    let mut tt = todos();
    set_value(&mut tt, 1, "newBar")?;
    tt.go_to(0)?;
    set_value(&mut tt, 1, "X")?;
    writeln!(out, "{}", tt.state().summary())?;
    print_history(&tt, out)?;

    writeln!(out, "== checkpoint restore")?;
    let mut tt = todos();
    set_value(&mut tt, 0, "a")?;
    set_value(&mut tt, 0, "b")?;
    tt.save_checkpoint()?;
    set_value(&mut tt, 0, "c")?;
    set_value(&mut tt, 0, "d")?;
    tt.restore_checkpoint()?;
    writeln!(out, "{}", tt.state().summary())?;
    print_history(&tt, out)?;

    writeln!(out, "== stale checkpoint")?;
    let mut tt = todos();
    set_value(&mut tt, 0, "a")?;
    tt.save_checkpoint()?;
    tt.go_back()?;
    set_value(&mut tt, 0, "z")?;
    tt.restore_checkpoint()?;
    writeln!(out, "{}", tt.state().summary())?;
    print_history(&tt, out)?;

    writeln!(out, "== in-place mutation")?;
    let mut tt = todos();
    set_value(&mut tt, 1, "newBar")?;
    mutate(&tt, 0, "0.value", Value::from("oops"))?;
    match tt.render() {
        Ok(()) => writeln!(out, "no mutation detected")?,
        Err(err) => writeln!(out, "{err}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkthroughs_print_expected_states() {
        let mut out = Vec::new();
        run(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("History: step=1/1 in_history=true checkpoint=0"));
        assert!(out.contains("History: step=2/4 in_history=true checkpoint=2"));
        assert!(out.contains("History: step=1/1 in_history=true checkpoint=1 (stale)"));
        assert!(out.contains(
            "a state mutation was detected in the history object at path: 0.0.value. Value: \"oops\""
        ));
    }
}
