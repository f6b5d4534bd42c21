use anyhow::Result;

use crate::config::Config;

pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let rebuild = &config.rebuild;

    println!("dbcycle Configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!("Control Plane:");
    println!("  API URL:            {}", config.base_url);
    println!("  API Key:            {}", mask(rebuild.api_key.as_deref()));
    println!();
    println!("Database:");
    println!("  Name:               {}", rebuild.database_name.as_deref().unwrap_or("(not set)"));
    println!("  Region:             {}", rebuild.region.as_deref().unwrap_or("(not set)"));
    println!("  Plan:               {}", rebuild.plan);
    println!("  PostgreSQL Version: {}", rebuild.postgres_version);
    println!();
    println!("Services:");
    println!("  Env Key:            {}", rebuild.env_key.as_deref().unwrap_or("(not set)"));
    println!();
    println!("Polling:");
    println!("  Database:           {:?}", rebuild.database_poll);
    println!("  Deploy:             {:?}", rebuild.deploy_poll);

    if let Err(e) = rebuild.validate() {
        println!();
        println!("⚠ {}", e);
    }

    Ok(())
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None | Some("") => "(not set)".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => format!("{}****", s.chars().take(4).collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_all_but_prefix() {
        assert_eq!(mask(Some("rnd_abcdef123")), "rnd_****");
        assert_eq!(mask(Some("abc")), "****");
        assert_eq!(mask(None), "(not set)");
    }
}
