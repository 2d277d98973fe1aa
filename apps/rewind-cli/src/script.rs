use std::cell::RefCell;
use std::io::Write;
use std::path::Path as FsPath;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use rewind_common::Path;
use rewind_host::{ContainerConfig, TimeTravel};
use rewind_kernel::{StepInput, Update};
use rewind_value::{Draft, DraftError, Value, ValueProducer};
use serde::Deserialize;

pub type Container = TimeTravel<Value, ValueProducer>;

/// A replayable session: an initial value and the commands to run on it.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub initial: Value,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
    #[serde(default)]
    pub commands: Vec<Op>,
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Op {
    /// Write a whole new value.
    Set {
        value: Value,
        #[serde(default = "recorded")]
        record: bool,
    },
    /// Write one entry of the current value through a draft.
    Patch {
        path: String,
        value: Value,
        #[serde(default = "recorded")]
        record: bool,
    },
    /// Navigate. The step is passed through untouched so bad input reaches
    /// the validator.
    GoTo { step: serde_json::Value },
    GoBack,
    GoForward,
    SaveCheckpoint,
    RestoreCheckpoint,
    Reset,
    /// Edit a history entry in place, behind the container's back.
    Mutate {
        step: usize,
        path: String,
        value: Value,
    },
    /// Re-run the audit without changing anything.
    Render,
}

fn recorded() -> bool {
    true
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Patch { .. } => "patch",
            Self::GoTo { .. } => "goTo",
            Self::GoBack => "goBack",
            Self::GoForward => "goForward",
            Self::SaveCheckpoint => "saveCheckpoint",
            Self::RestoreCheckpoint => "restoreCheckpoint",
            Self::Reset => "reset",
            Self::Mutate { .. } => "mutate",
            Self::Render => "render",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &FsPath) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            other => bail!("unsupported script extension {other:?}, expected json, yaml or yml"),
        }
    }
}

impl Script {
    pub fn parse(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Json => serde_json::from_str(text).context("invalid JSON script"),
            Format::Yaml => serde_yaml::from_str(text).context("invalid YAML script"),
        }
    }

    pub fn load(path: &FsPath) -> Result<Self> {
        let format = Format::from_path(path)?;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text, format).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Run every command, writing one line per command to `out`.
    pub fn run(self, out: &mut impl Write) -> Result<Container> {
        let config = self.config.unwrap_or_default();
        let mut tt = TimeTravel::new(self.initial, ValueProducer, config);
        writeln!(out, "start: {}", tt.state().summary())?;

        for (index, op) in self.commands.into_iter().enumerate() {
            let name = op.name();
            let commits = tt.commits();
            apply(&mut tt, op).with_context(|| format!("command #{index} ({name}) failed"))?;
            if tt.commits() == commits {
                writeln!(out, "#{index} {name}: no change")?;
            } else {
                writeln!(out, "#{index} {name}: {}", tt.state().summary())?;
            }
        }
        Ok(tt)
    }
}

fn apply(tt: &mut Container, op: Op) -> Result<()> {
    match op {
        Op::Set { value, record } => tt.set_state(Update::Replace(value), record)?,
        Op::Patch {
            path,
            value,
            record,
        } => patch(tt, &path, value, record)?,
        Op::GoTo { step } => tt.go_to(step_input(&step))?,
        Op::GoBack => tt.go_back()?,
        Op::GoForward => tt.go_forward()?,
        Op::SaveCheckpoint => tt.save_checkpoint()?,
        Op::RestoreCheckpoint => tt.restore_checkpoint()?,
        Op::Reset => tt.reset()?,
        Op::Mutate { step, path, value } => mutate(tt, step, &path, value)?,
        Op::Render => tt.render()?,
    }
    Ok(())
}

/// Write `value` at a dotted `path` of the current item through a draft.
pub fn patch(tt: &mut Container, path: &str, value: Value, record: bool) -> Result<()> {
    let path = Path::parse(path);
    let failure: Rc<RefCell<Option<DraftError>>> = Rc::default();
    let sink = Rc::clone(&failure);
    let edit = move |draft: &mut Draft| {
        if let Err(err) = draft.set_in(path, value) {
            *sink.borrow_mut() = Some(err);
        }
    };
    tt.set_state(Update::recipe(edit), record)?;
    if let Some(err) = failure.take() {
        return Err(err.into());
    }
    Ok(())
}

/// Overwrite part of a committed history entry in place.
pub fn mutate(tt: &Container, step: usize, path: &str, value: Value) -> Result<()> {
    let Some(entry) = tt.history().get(step) else {
        bail!("no history entry at step {step}");
    };
    let path = Path::parse(path);
    if !entry.write_in_place(path.clone(), value) {
        bail!("cannot write at '{path}' in history entry {step}");
    }
    Ok(())
}

fn step_input(step: &serde_json::Value) -> StepInput {
    match step {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => StepInput::Int(i),
            None => StepInput::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        other => StepInput::Invalid(other.to_string()),
    }
}

/// Print every history entry, marking the cursor and the checkpoint.
pub fn print_history(tt: &Container, out: &mut impl Write) -> Result<()> {
    for (index, entry) in tt.history().iter().enumerate() {
        let cursor = if index == tt.step_num() && tt.is_part_of_history() {
            '>'
        } else {
            ' '
        };
        let pin = if index == tt.checkpoint() && tt.is_checkpoint_valid() {
            '*'
        } else {
            ' '
        };
        writeln!(out, "{cursor}{pin} {index}: {entry}")?;
    }
    if !tt.is_part_of_history() {
        writeln!(out, ">  (draft): {}", tt.current_item())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TODOS: &str = include_str!("../scripts/todos.yaml");

    fn run(script: Script) -> (Result<Container>, String) {
        let mut out = Vec::new();
        let result = script.run(&mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn bundled_script_replays() {
        let script = Script::parse(TODOS, Format::Yaml).unwrap();
        let (result, log) = run(script);
        let tt = result.unwrap();

        assert_eq!(tt.history().len(), 2);
        assert_eq!(tt.step_num(), 1);
        assert_eq!(tt.checkpoint(), 1);
        assert!(tt.is_checkpoint_valid());
        assert_eq!(
            *tt.current_item(),
            Value::from(json!([{ "id": 0, "value": "foo" }, { "id": 1, "value": "X" }]))
        );
        assert_eq!(tt.commits(), 9);
        assert!(log.contains("#7 restoreCheckpoint: no change"));
        assert!(log.contains("#9 goTo: no change"));
        assert!(log.contains("#10 goTo: no change"));
        assert!(log.contains("#11 goForward: no change"));
    }

    #[test]
    fn json_script_with_excluded_write() {
        let text = r#"{
            "initial": { "count": 0 },
            "commands": [
                { "op": "patch", "path": "count", "value": 1 },
                { "op": "set", "value": { "count": 5 }, "record": false }
            ]
        }"#;
        let (result, log) = run(Script::parse(text, Format::Json).unwrap());
        let tt = result.unwrap();
        assert_eq!(tt.history().len(), 2);
        assert!(!tt.is_part_of_history());
        assert_eq!(*tt.current_item(), Value::from(json!({ "count": 5 })));
        assert!(log.starts_with("start: History: step=0/0"));

        let mut listing = Vec::new();
        print_history(&tt, &mut listing).unwrap();
        let listing = String::from_utf8(listing).unwrap();
        assert!(listing.contains(r#" 1: {"count":1}"#));
        assert!(listing.contains(r#"(draft): {"count":5}"#));
    }

    #[test]
    fn mutation_aborts_replay() {
        let text = r#"
initial: [{ id: 0, value: foo }]
config: { enable_mutation_detection: true }
commands:
  - { op: mutate, step: 0, path: "0.value", value: x }
  - { op: render }
  - { op: reset }
"#;
        let (result, log) = run(Script::parse(text, Format::Yaml).unwrap());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("command #1 (render)"));
        let cause = err.downcast_ref::<rewind_audit::MutationError>().unwrap();
        assert_eq!(cause.path.to_string(), "0.0.value");
        assert!(log.contains("#0 mutate: no change"));
        assert!(!log.contains("reset"));
    }

    #[test]
    fn bad_patch_path_is_an_error() {
        let text = r#"{ "initial": [1], "commands": [{ "op": "patch", "path": "5", "value": 2 }] }"#;
        let (result, _) = run(Script::parse(text, Format::Json).unwrap());
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<DraftError>().is_some());
    }

    #[test]
    fn mutate_rejects_missing_targets() {
        let script = Script::parse(r#"{ "initial": [{ "value": 1 }] }"#, Format::Json).unwrap();
        let (result, _) = run(script);
        let tt = result.unwrap();
        let err = mutate(&tt, 3, "0.value", Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "no history entry at step 3");
        let err = mutate(&tt, 0, "0.value.deeper", Value::Null).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot write at '0.value.deeper' in history entry 0"
        );
        assert!(mutate(&tt, 0, "0.value", Value::from(2)).is_ok());
    }

    #[test]
    fn patch_reports_draft_errors() {
        let script = Script::parse(r#"{ "initial": { "name": "x" } }"#, Format::Json).unwrap();
        let (result, _) = run(script);
        let mut tt = result.unwrap();
        let err = patch(&mut tt, "name.first", Value::from("y"), true).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DraftError>(),
            Some(&DraftError::NotAContainer { kind: "string" })
        );
        assert_eq!(tt.commits(), 0);
        patch(&mut tt, "name", Value::from("y"), true).unwrap();
        assert_eq!(tt.history().len(), 2);
    }

    #[test]
    fn non_numeric_step_is_rejected_quietly() {
        assert_eq!(step_input(&json!("two")), StepInput::Invalid("\"two\"".into()));
        assert_eq!(step_input(&json!(1.5)), StepInput::Float(1.5));
        assert_eq!(step_input(&json!(-3)), StepInput::Int(-3));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(FsPath::new("a.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(FsPath::new("a.json")).unwrap(), Format::Json);
        assert!(Format::from_path(FsPath::new("a.toml")).is_err());
    }
}
