use std::path::PathBuf;

use crate::args::{Command, LoadlineArgs, RewriteFieldArgs};
use crate::config::{Environment, load_environments};
use crate::error::{AppError, AppResult, ValidationError};

pub(super) enum RunPlan {
    Rewrite(RewriteFieldArgs),
    ListEnvs(PathBuf),
    Load(Box<LoadPlan>),
}

pub(super) struct LoadPlan {
    pub(super) args: LoadlineArgs,
    pub(super) environment: Environment,
}

/// Validates everything that can fail before a runtime is built: flag
/// combinations, the environment file and the environment lookup.
pub(super) fn build_plan(mut args: LoadlineArgs) -> AppResult<RunPlan> {
    if let Some(command) = args.command.take() {
        match command {
            Command::RewriteField(rewrite_args) => {
                rewrite_args.range()?;
                return Ok(RunPlan::Rewrite(rewrite_args));
            }
        }
    }

    if args.list_envs {
        let config = args
            .config
            .clone()
            .ok_or_else(|| AppError::validation(ValidationError::MissingConfig))?;
        return Ok(RunPlan::ListEnvs(config));
    }

    let env = args
        .env
        .clone()
        .ok_or_else(|| AppError::validation(ValidationError::MissingEnv))?;
    let config = args
        .config
        .clone()
        .ok_or_else(|| AppError::validation(ValidationError::MissingConfig))?;
    if args.data.is_none() && args.request_body.is_none() {
        return Err(AppError::validation(ValidationError::NothingToSend));
    }
    if args.data.is_some() {
        args.selection()?;
    }

    let environments = load_environments(&config)?;
    let environment = environments.lookup(&env, args.api_key.as_deref())?;
    Ok(RunPlan::Load(Box::new(LoadPlan { args, environment })))
}
