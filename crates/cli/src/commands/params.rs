//! Print the configured world parameters and circuit revisions

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use df_runtime::{OrchestratorConfig, load_game_params};
use df_zk::HexWidth;

#[derive(Debug, Parser)]
pub struct Params {
    /// Print as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Params {
    pub fn execute(&self, config: &OrchestratorConfig) -> Result<()> {
        let params = load_game_params(&config.game_config).with_context(|| {
            format!(
                "Failed to load game parameters: {}",
                config.game_config.display()
            )
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&params)?);
            return Ok(());
        }

        println!(
            "{} {}",
            style("Game config:").bold().cyan(),
            style(config.game_config.display()).dim()
        );
        let rows = [
            ("PLANETHASH_KEY", params.planethash_key),
            ("SPACETYPE_KEY", params.spacetype_key),
            ("BIOMEBASE_KEY", params.biomebase_key),
            ("PERLIN_LENGTH_SCALE", params.perlin_length_scale),
            ("WORLD_RADIUS_MIN", params.world_radius_min),
        ];
        for (name, value) in rows {
            let decimal = value.to_biguint();
            println!("  {:<20} {} ({})", name, decimal, value.to_hex(HexWidth::Narrow));
        }

        println!();
        println!("{}", style("Circuits:").bold().yellow());
        for (kind, circuit) in &config.circuits {
            let handle = config.circuit_handle(*kind)?;
            let layout = circuit
                .move_layout
                .map(|layout| format!(", move layout {layout:?}"))
                .unwrap_or_default();
            println!(
                "  {:<10} {}  (width {:?}{})",
                kind,
                style(handle.dir().display()).dim(),
                circuit.value_width,
                layout
            );
        }
        Ok(())
    }
}
