use anyhow::{Context, Result};
use clap::Parser;
use swarm::{attraction::ForceModel, config::InputModel, Swarm, SwarmConfig};

#[derive(Parser, Debug)]
#[command(about = "Spheres drawn toward a movable point of gravity around a spinning core")]
struct Args {
    /// TOML configuration file, every key is optional
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Which input events steer the gravity target: pointer or mouse
    #[arg(long)]
    input: Option<InputModel>,

    /// How impulses scale with distance: normalized or inverse-square
    #[arg(long)]
    force: Option<ForceModel>,

    /// The swarm holds the square of this many balls
    #[arg(long)]
    balls_per_side: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<SwarmConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => SwarmConfig::load(path)
                .with_context(|| format!("Could not load '{}'", path.display()))?,
            None => SwarmConfig::default(),
        };
        if let Some(input) = self.input {
            config.input.model = input;
        }
        if let Some(force) = self.force {
            config.attraction.force_model = force;
        }
        if let Some(balls_per_side) = self.balls_per_side {
            config.balls_per_side = balls_per_side;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    swarm::init_logging();
    let config = Args::parse().into_config()?;
    log::info!(
        "Simulating {} balls with the {} force model",
        config.ball_count(),
        config.attraction.force_model
    );
    swarm::run(Swarm::new(config)).context("The viewer stopped unexpectedly")?;
    Ok(())
}
