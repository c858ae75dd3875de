use anyhow::{bail, Result};

use toolrun_core::api::OperationConfig;
use toolrun_core::Operation;

use crate::command::CommandOperation;
use crate::replay::ReplayOperation;

pub fn build_operation(cfg: &OperationConfig) -> Result<Box<dyn Operation>> {
    match cfg {
        OperationConfig::Replay(r_cfg) => {
            if r_cfg.events_file.trim().is_empty() {
                bail!("replay operation needs events_file");
            }
            let name = r_cfg.name.clone().unwrap_or_else(|| "replay".to_string());
            Ok(Box::new(ReplayOperation::new(name, &r_cfg.events_file)))
        }
        OperationConfig::Command(c_cfg) => {
            if c_cfg.program.trim().is_empty() {
                bail!("command operation needs program");
            }
            let name = c_cfg.name.clone().unwrap_or_else(|| c_cfg.program.clone());
            let mut op = CommandOperation::new(name, &c_cfg.program)
                .args(c_cfg.args.iter().cloned())
                .envs(c_cfg.env.clone());
            if let Some(cwd) = &c_cfg.cwd {
                op = op.cwd(cwd);
            }
            Ok(Box::new(op))
        }
    }
}
