pub mod enroll;
pub mod import;
pub mod init;
pub mod list;
pub mod registration;
pub mod roster;
pub mod score;
pub mod student;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use shinsa_core::model::RosterSnapshot;
use shinsa_core::service::GradingService;
use shinsa_core::{Rank, RankOrdering};

/// Build the grading service from the config file.
pub(crate) fn open_service(config: Option<PathBuf>) -> Result<GradingService> {
    let config = shinsa_store::load_config_from(config.as_deref())?;
    let gateway = shinsa_store::create_gateway(&config.store);
    tracing::debug!("opened {} store", gateway.name());
    Ok(GradingService::new(
        gateway,
        RankOrdering::standard(),
        config.service_config(),
    ))
}

/// Resolve a rank given on the command line.
pub(crate) fn parse_rank(ranks: &RankOrdering, raw: &str) -> Result<Rank> {
    ranks.resolve(raw).ok_or_else(|| {
        let names: Vec<&str> = ranks.ranks().iter().map(|r| r.name()).collect();
        anyhow!("unknown rank: {raw} (expected one of: {})", names.join(", "))
    })
}

/// Resolve a sensei given by id or by name.
pub(crate) fn resolve_sensei_id(snapshot: &RosterSnapshot, raw: &str) -> Result<String> {
    snapshot
        .sensei(raw)
        .or_else(|| snapshot.sensei_by_name(raw))
        .map(|s| s.id.clone())
        .ok_or_else(|| anyhow!("sensei not found: {raw}"))
}

pub(crate) fn format_score(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}
