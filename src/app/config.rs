use std::path::Path;

use crate::config::ResolvedConfig;
use crate::duration::format_duration;

pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "data_directory": config.data_dir.display().to_string(),
        "history": {
            "interactive": config.interactive_history.display().to_string(),
            "periodic": config.periodic_history.display().to_string(),
            "advance_baseline": config.history.advance_baseline,
        },
        "account": {
            "id": config.account.id,
            "operations_from": config.account.operations_from,
            "operations_lookback": format_duration(config.account.operations_lookback),
            "invest_start": config.account.invest_start,
        },
        "refresh": {
            "cache_ttl": format_duration(config.refresh.cache_ttl),
            "poll_interval": format_duration(config.refresh.poll_interval),
            "poll_jitter": format_duration(config.refresh.poll_jitter),
        },
        "display": config.display,
        "credentials": config.credentials,
    })
}
