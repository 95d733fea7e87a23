//! `zonewatch announce` — Draft a targeted announcement.

use super::{CmdResult, load_config};
use zonewatch_agent::{AnnouncementRequest, OperationsFlows};
use zonewatch_index::EngineSettings;

pub async fn run(zone: String, user_group: String, real_time_needs: String) -> CmdResult {
    let config = load_config()?;
    let provider = zonewatch_providers::build_provider(&config)?;
    let flows = OperationsFlows::new(EngineSettings::from_config(provider, &config));

    let request = AnnouncementRequest {
        zone,
        user_group,
        real_time_needs,
    };
    let announcement = flows.targeted_announcement(&request).await?;
    println!("{}", announcement.announcement);

    Ok(())
}
