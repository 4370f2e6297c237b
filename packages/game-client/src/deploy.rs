//! Idempotent deployment: decide whether the creator's latest app can be
//! reused, must be replaced, or blocks the deploy.

use crate::ledger::CreatedApp;
use crate::transaction::StateSchema;
use crate::Error;
use game_contract::constants::{
    APPROVAL_PROGRAM, CLEAR_PROGRAM, GLOBAL_BYTES, GLOBAL_UINTS, LOCAL_BYTES, LOCAL_UINTS,
};
use std::path::Path;

const NOTE_PREFIX: &str = "deploy:";

/// What to do when the programs changed but the schema still fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnUpdate {
    Fail,
    AppendApp,
}

/// What to do when the new schema needs more slots than the deployed app has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnSchemaBreak {
    Fail,
    AppendApp,
}

/// Programs and storage schema of a deployable application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSpec {
    pub name: String,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

impl AppSpec {
    /// The game contract as built into this workspace.
    pub fn game() -> Self {
        Self {
            name: "game".to_string(),
            approval_program: APPROVAL_PROGRAM.to_vec(),
            clear_program: CLEAR_PROGRAM.to_vec(),
            global_schema: StateSchema::new(GLOBAL_UINTS, GLOBAL_BYTES),
            local_schema: StateSchema::new(LOCAL_UINTS, LOCAL_BYTES),
        }
    }

    /// Game schema with programs read from compiled files.
    pub fn from_files(approval: &Path, clear: &Path) -> Result<Self, Error> {
        let read = |path: &Path| {
            std::fs::read(path)
                .map_err(|e| Error::Config(format!("read program {}: {e}", path.display())))
        };
        Ok(Self {
            approval_program: read(approval)?,
            clear_program: read(clear)?,
            ..Self::game()
        })
    }

    /// Creation note so deployments are recognisable on-chain.
    pub fn note(&self) -> Vec<u8> {
        format!("{NOTE_PREFIX}{}", self.name).into_bytes()
    }

    /// Inverse of [`AppSpec::note`].
    pub fn name_from_note(note: &[u8]) -> Option<String> {
        let note = std::str::from_utf8(note).ok()?;
        note.strip_prefix(NOTE_PREFIX)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    /// Apps without a recorded name are assumed to match.
    fn same_name(&self, app: &CreatedApp) -> bool {
        app.name.as_deref().map_or(true, |name| name == self.name)
    }

    fn same_programs(&self, app: &CreatedApp) -> bool {
        self.approval_program == app.approval_program && self.clear_program == app.clear_program
    }

    fn breaks_schema(&self, app: &CreatedApp) -> bool {
        self.global_schema.exceeds(&app.global_schema) || self.local_schema.exceeds(&app.local_schema)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Created { app_id: u64 },
    Unchanged { app_id: u64 },
    Appended { app_id: u64, previous: u64 },
}

impl DeployOutcome {
    pub fn app_id(&self) -> u64 {
        match self {
            DeployOutcome::Created { app_id }
            | DeployOutcome::Unchanged { app_id }
            | DeployOutcome::Appended { app_id, .. } => *app_id,
        }
    }
}

/// Deployment decision before any transaction is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Create,
    Reuse(u64),
    Append { previous: u64 },
}

/// Compare `spec` with the creator's most recent application of the same name.
pub fn plan(
    spec: &AppSpec,
    existing: &[CreatedApp],
    on_schema_break: OnSchemaBreak,
    on_update: OnUpdate,
) -> Result<DeployAction, Error> {
    let Some(latest) = existing
        .iter()
        .filter(|app| spec.same_name(app))
        .max_by_key(|app| app.id)
    else {
        return Ok(DeployAction::Create);
    };

    if spec.breaks_schema(latest) {
        return match on_schema_break {
            OnSchemaBreak::AppendApp => Ok(DeployAction::Append { previous: latest.id }),
            OnSchemaBreak::Fail => Err(Error::Deploy(format!(
                "{}: schema break against app {}",
                spec.name, latest.id
            ))),
        };
    }
    if !spec.same_programs(latest) {
        return match on_update {
            OnUpdate::AppendApp => Ok(DeployAction::Append { previous: latest.id }),
            OnUpdate::Fail => Err(Error::Deploy(format!(
                "{}: programs differ from app {}",
                spec.name, latest.id
            ))),
        };
    }
    Ok(DeployAction::Reuse(latest.id))
}
