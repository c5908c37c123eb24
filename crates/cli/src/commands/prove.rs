//! Prove one action, reusing the cached proof when it is still valid.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use df_runtime::{CacheStatus, Orchestrator, OrchestratorConfig, TestCaseId};
use df_zk::{
    ActionRequest, Address, BiomebaseRequest, Coords, FieldValue, InitRequest, Location,
    MoveRequest, RevealRequest, WhitelistRequest,
};

#[derive(Debug, Parser)]
pub struct Prove {
    /// Cache key for this scenario (e.g. "planet_1_init")
    #[arg(short, long)]
    test_case: TestCaseId,

    /// Replace the first public input before printing (negative testing)
    #[arg(long, value_name = "VALUE")]
    corrupt_first_input: Option<FieldValue>,

    #[command(subcommand)]
    action: ActionArgs,
}

#[derive(Debug, Subcommand)]
enum ActionArgs {
    /// Spawn a player on a planet
    Init(PlanetArgs),

    /// Publish a planet's coordinates
    Reveal(PlanetArgs),

    /// Move ships between two planets
    Move(MoveArgs),

    /// Redeem a whitelist key
    Whitelist(WhitelistArgs),

    /// Prove a planet's biomebase
    Biomebase(BiomebaseArgs),

    /// Read the action from a JSON file (`{"action": "init", ...}`)
    File { path: PathBuf },
}

#[derive(Debug, Args)]
struct PlanetArgs {
    #[arg(long, allow_hyphen_values = true)]
    x: i64,

    #[arg(long, allow_hyphen_values = true)]
    y: i64,

    /// Location commitment (planet hash)
    #[arg(long)]
    commitment: FieldValue,

    #[arg(long)]
    perlin: u64,
}

impl PlanetArgs {
    fn coords(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    fn location(&self) -> Location {
        Location::new(self.commitment, self.perlin)
    }
}

#[derive(Debug, Args)]
struct BiomebaseArgs {
    #[command(flatten)]
    planet: PlanetArgs,

    #[arg(long)]
    biomebase: u64,
}

#[derive(Debug, Args)]
struct MoveArgs {
    #[arg(long, allow_hyphen_values = true)]
    from_x: i64,
    #[arg(long, allow_hyphen_values = true)]
    from_y: i64,
    #[arg(long, allow_hyphen_values = true)]
    to_x: i64,
    #[arg(long, allow_hyphen_values = true)]
    to_y: i64,

    #[arg(long)]
    from_commitment: FieldValue,
    #[arg(long)]
    to_commitment: FieldValue,

    /// Perlin value of the destination
    #[arg(long)]
    perlin: u64,

    /// Destination distance from origin
    #[arg(long, default_value_t = 0)]
    dist_from_origin: u64,

    #[arg(long)]
    max_distance: u64,

    #[arg(long, default_value_t = 0)]
    population: u64,

    #[arg(long, default_value_t = 0)]
    silver: u64,

    #[arg(long, default_value = "0")]
    artifact_id: FieldValue,

    #[arg(long)]
    abandoning: bool,
}

#[derive(Debug, Args)]
struct WhitelistArgs {
    #[arg(long)]
    key: FieldValue,

    #[arg(long)]
    key_hash: FieldValue,

    #[arg(long)]
    recipient: Address,
}

impl ActionArgs {
    fn into_request(self) -> Result<ActionRequest> {
        Ok(match self {
            ActionArgs::Init(args) => ActionRequest::Init(InitRequest {
                coords: args.coords(),
                location: args.location(),
            }),
            ActionArgs::Reveal(args) => ActionRequest::Reveal(RevealRequest {
                coords: args.coords(),
                location: args.location(),
            }),
            ActionArgs::Biomebase(args) => ActionRequest::Biomebase(BiomebaseRequest {
                coords: args.planet.coords(),
                location: Location {
                    biomebase: args.biomebase,
                    ..args.planet.location()
                },
            }),
            ActionArgs::Move(args) => ActionRequest::Move(MoveRequest {
                from: Coords::new(args.from_x, args.from_y),
                to: Coords::new(args.to_x, args.to_y),
                from_location: Location::new(args.from_commitment, 0),
                to_location: Location {
                    dist_from_origin: args.dist_from_origin,
                    ..Location::new(args.to_commitment, args.perlin)
                },
                max_distance: args.max_distance,
                population_moved: args.population,
                silver_moved: args.silver,
                artifact_id: args.artifact_id,
                abandoning: args.abandoning,
            }),
            ActionArgs::Whitelist(args) => ActionRequest::Whitelist(WhitelistRequest {
                key: args.key,
                key_hash: args.key_hash,
                recipient: args.recipient,
            }),
            ActionArgs::File { path } => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read action file: {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Invalid action in {}", path.display()))?
            }
        })
    }
}

impl Prove {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let request = self.action.into_request()?;
        let kind = request.kind();
        let orchestrator =
            Orchestrator::from_config(config).context("Failed to set up orchestrator")?;

        eprintln!(
            "{} {} proof for {}",
            style("Preparing").bold().cyan(),
            kind,
            style(&self.test_case).bold()
        );
        let mut prepared = orchestrator
            .prepare(&self.test_case, &request)
            .with_context(|| format!("Failed to prepare {kind} action"))?;

        match prepared.status {
            CacheStatus::Hit => eprintln!("{}", style("✓ Using cached proof").green()),
            CacheStatus::Miss => eprintln!("{}", style("✓ New proof generated").green()),
        }
        eprintln!(
            "  Hash:  {}",
            style(prepared.artifact.content_hash()).dim()
        );
        eprintln!("  Size:  {} bytes", prepared.artifact.bytes().len());

        if let Some(value) = self.corrupt_first_input {
            let previous = prepared.call_args.replace_input(0, value)?;
            eprintln!(
                "{} first input {:?} replaced",
                style("!").yellow().bold(),
                previous
            );
        }

        eprintln!(
            "{} {}",
            style("Entrypoint:").bold().cyan(),
            prepared.call_args.entrypoint()
        );
        println!("{}", serde_json::to_string_pretty(&prepared.call_args)?);
        Ok(())
    }
}
