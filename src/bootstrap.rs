//! Post-provisioning bootstrap through an AWX job template.
//!
//! `apply` launches the bootstrap playbook with the full cluster metadata,
//! `destroy` launches the teardown playbook with a reduced set. Any other mode
//! declares nothing.

use serde_json::{Map, Value};
use tracing::info;

use crate::config::Mode;
use crate::error::{Result, StackError};
use crate::infra::Environment;
use crate::providers;
use crate::terraform::{Address, Block, Stack};

pub const APPLY_TEMPLATE_ID: u32 = 779;
pub const DESTROY_TEMPLATE_ID: u32 = 780;
pub const CLOUD: &str = "aws";

/// Cluster metadata handed to the playbook.
#[derive(Debug, Clone)]
pub struct BootstrapParams {
    pub cluster_name: String,
    pub environment: Environment,
    pub region: String,
    /// Interpolation of the cluster endpoint output.
    pub cluster_url: String,
    pub aws_account: String,
}

/// Job template launched for `mode`, if any.
pub fn job_template(mode: Mode) -> Option<u32> {
    match mode {
        Mode::Apply => Some(APPLY_TEMPLATE_ID),
        Mode::Destroy => Some(DESTROY_TEMPLATE_ID),
        Mode::Other => None,
    }
}

/// Extra variables for the job. Destroy omits the cluster URL and account.
pub fn extra_vars(mode: Mode, params: &BootstrapParams) -> Option<Map<String, Value>> {
    job_template(mode)?;

    let mut vars = Map::new();
    vars.insert("cluster_name".into(), params.cluster_name.clone().into());
    vars.insert("env".into(), params.environment.label().into());
    vars.insert("cloud".into(), CLOUD.into());
    vars.insert("region".into(), params.region.clone().into());
    if mode == Mode::Apply {
        vars.insert("cluster_url".into(), params.cluster_url.clone().into());
        vars.insert("aws_account".into(), params.aws_account.clone().into());
    }
    Some(vars)
}

/// Declare the job launch, ordered after the cluster, every node group and the add-ons.
///
/// Returns `None` when `mode` launches nothing; the AWX provider is only
/// configured when a job is declared.
pub fn trigger(
    stack: &mut Stack,
    mode: Mode,
    params: &BootstrapParams,
    awx_host: &str,
    after: &[Address],
) -> Result<Option<Address>> {
    let (Some(template_id), Some(vars)) = (job_template(mode), extra_vars(mode, params)) else {
        info!(
            cluster = %params.cluster_name,
            mode = mode.as_str(),
            "No bootstrap job for this mode"
        );
        return Ok(None);
    };

    let awx = providers::awx(stack, awx_host);
    let extra_vars = serde_json::to_string(&Value::Object(vars)).map_err(StackError::Render)?;

    let address = stack.add(
        Block::resource(
            "awx_job_template_launch",
            &format!("template-launch-{}", params.cluster_name),
        )
        .provider(&awx)
        .attr("job_template_id", template_id)
        .attr("extra_vars", extra_vars)
        .attr("wait_for_completion", true)
        .depends_on_all(after),
    )?;

    info!(
        cluster = %params.cluster_name,
        mode = mode.as_str(),
        template_id,
        "Declared bootstrap job"
    );
    Ok(Some(address))
}
