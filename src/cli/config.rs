use crate::error::{HarvestError, Result};
use crate::models::NetSplit;
use crate::settings::{load_settings, save_settings};

pub fn show() -> Result<()> {
    let settings = load_settings();
    let owner = if settings.owner_name.is_empty() {
        "(not set)"
    } else {
        &settings.owner_name
    };
    println!("Owner:          {owner}");
    println!("Data dir:       {}", settings.data_dir);
    println!("Net split:      {}", settings.net_split);
    println!("Harvest offset: {} months", settings.harvest_offset_months);
    Ok(())
}

pub fn set_split(split: &str) -> Result<()> {
    let split: NetSplit = split.parse()?;
    let mut settings = load_settings();
    settings.net_split = split;
    save_settings(&settings)?;
    tracing::info!(%split, "net split changed");
    println!("Net split set to {split}");
    Ok(())
}

pub fn set_offset(months: u32) -> Result<()> {
    if months == 0 {
        return Err(HarvestError::Validation(
            "Harvest offset must be at least 1 month".into(),
        ));
    }
    let mut settings = load_settings();
    settings.harvest_offset_months = months;
    save_settings(&settings)?;
    println!("Harvest offset set to {months} months");
    Ok(())
}

pub fn set_owner(name: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.owner_name = name.trim().to_string();
    save_settings(&settings)?;
    println!("Owner set to {}", settings.owner_name);
    Ok(())
}
