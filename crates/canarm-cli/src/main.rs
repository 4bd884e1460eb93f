//! canarm - Command-line tool for CAN-bridged manipulator control
//!
//! Drives dual-arm manipulators and their hands through an HTTP CAN bridge:
//! joint commands, feedback read-back, sequence recording and playback.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use canarm_bridge::create_transport;
use canarm_codec::RegisterIndex;
use canarm_control::{ControlService, HandFamily, HandProfile};
use canarm_core::{ArmModel, ManipulatorRegistry, Side};
use canarm_seq::SequenceStore;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::JointAction;
use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "canarm")]
#[command(author, version, about = "CAN-bridged manipulator control")]
#[command(propagate_version = true)]
struct Cli {
    /// CAN bridge URL
    #[arg(short, long, env = "CANARM_BRIDGE")]
    bridge: Option<String>,

    /// Configuration file path (TOML or YAML)
    #[arg(short, long, env = "CANARM_CONFIG")]
    config: Option<PathBuf>,

    /// Sequence store directory
    #[arg(short = 'd', long, env = "CANARM_DATA")]
    data_dir: Option<PathBuf>,

    /// Use a simulated in-memory bus instead of the bridge
    #[arg(long)]
    mock: bool,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured arms
    Arms,

    /// Enable joints (position-profile mode, then drive enable)
    Enable {
        /// Bus interface of the arm
        interface: String,

        /// Single motor id; all joints if omitted
        #[arg(short, long)]
        motor: Option<u8>,
    },

    /// Disable joints
    Disable {
        /// Bus interface of the arm
        interface: String,

        /// Single motor id; all joints if omitted
        #[arg(short, long)]
        motor: Option<u8>,
    },

    /// Clear motor faults
    Clear {
        /// Bus interface of the arm
        interface: String,

        /// Single motor id; all joints if omitted
        #[arg(short, long)]
        motor: Option<u8>,
    },

    /// Mark the current position as zero
    Zero {
        /// Bus interface of the arm
        interface: String,

        /// Motor ids (comma separated); all joints if omitted
        #[arg(value_delimiter = ',')]
        motors: Vec<u8>,
    },

    /// Drive joints back to angle 0
    ReturnZero {
        /// Bus interface of the arm
        interface: String,

        /// Single motor id; all joints if omitted
        #[arg(short, long)]
        motor: Option<u8>,
    },

    /// Write one joint value
    Set {
        #[command(subcommand)]
        target: SetCommand,
    },

    /// Set every joint angle, in joint order
    SetAngles {
        /// Bus interface of the arm
        interface: String,

        /// One angle per joint (radians)
        #[arg(required = true, allow_negative_numbers = true)]
        angles: Vec<f32>,
    },

    /// Set every joint speed limit, in joint order
    SetSpeeds {
        /// Bus interface of the arm
        interface: String,

        /// One speed per joint, or a single speed for every joint
        #[arg(required = true)]
        speeds: Vec<f32>,
    },

    /// Read back joint angles and gains
    Read {
        /// Bus interface of the arm
        interface: String,
    },

    /// Record a way-point into the pending recording
    Record {
        /// Bus interface of the arm
        interface: String,

        /// Way-point name
        name: String,

        /// Joint angle as MOTOR=RADIANS; read from the arm if omitted
        #[arg(long = "angle", value_parser = parse_joint_angle)]
        angles: Vec<(u8, f32)>,
    },

    /// Show or clear the pending recording
    Records {
        /// Bus interface of the arm
        interface: String,

        /// Discard the pending way-points
        #[arg(long)]
        clear: bool,
    },

    /// Save the pending recording as a named sequence
    Finish {
        /// Bus interface of the arm
        interface: String,

        /// Sequence name
        name: String,

        /// Arm generation: old or new
        #[arg(long)]
        model: Option<ArmModel>,
    },

    /// Manage recorded sequences
    Seq {
        #[command(subcommand)]
        action: SeqCommand,
    },

    /// Manage merged left/right files
    Merged {
        #[command(subcommand)]
        action: MergedCommand,
    },

    /// Run the up/down routine of a merged file on both arms
    RunMerged {
        /// Merged file name (with or without .json)
        file: String,
    },

    /// Control a hand
    Hand {
        #[command(subcommand)]
        action: HandCommand,
    },
}

#[derive(Subcommand)]
enum SetCommand {
    /// Target angle of one joint
    Angle {
        interface: String,
        motor: u8,
        /// Radians
        #[arg(allow_negative_numbers = true)]
        value: f32,
    },

    /// Speed limit of one joint
    Speed {
        interface: String,
        motor: u8,
        value: f32,
    },

    /// Controller gain of one joint
    Gain {
        interface: String,
        motor: u8,
        #[arg(value_enum)]
        gain: GainArg,
        value: f32,
    },
}

#[derive(Subcommand)]
enum SeqCommand {
    /// List recorded sequences
    List,

    /// Show the way-points of a sequence
    Show { name: String },

    /// Delete a recorded sequence
    Delete { name: String },

    /// Merge a left and a right sequence into a paired file
    Merge {
        /// First sequence
        first: String,
        /// Second sequence
        second: String,
        /// Merged name; "up"/"down" in it selects the transform
        name: String,
        /// Arm generation: old or new
        #[arg(long)]
        model: Option<ArmModel>,
    },

    /// Play a sequence on one arm
    Play { interface: String, name: String },
}

#[derive(Subcommand)]
enum MergedCommand {
    /// List merged up/down files
    List,

    /// Play both sides of a merged file
    Play { file: String },
}

#[derive(Subcommand)]
enum HandCommand {
    /// Set six finger positions directly
    Fingers {
        /// left or right
        side: Side,
        /// thumb, thumb rotation, index, middle, ring, pinky (0-255)
        #[arg(num_args = 6, required = true)]
        values: Vec<u8>,
    },

    /// Apply a named profile
    Profile {
        /// left or right
        side: Side,
        /// Hand type: sks or sn
        family: HandFamily,
        /// press, release, high_thumb or high_pro_thumb
        profile: HandProfile,
    },
}

/// Writable gain registers
#[derive(Debug, Clone, Copy, ValueEnum)]
enum GainArg {
    #[value(name = "loc_kp")]
    PositionGain,
    #[value(name = "spd_kp")]
    VelocityGain,
    #[value(name = "spd_ki")]
    VelocityIntegralGain,
    #[value(name = "spd_filt_gain")]
    VelocityFilterGain,
}

impl From<GainArg> for RegisterIndex {
    fn from(gain: GainArg) -> Self {
        match gain {
            GainArg::PositionGain => RegisterIndex::PositionGain,
            GainArg::VelocityGain => RegisterIndex::VelocityGain,
            GainArg::VelocityIntegralGain => RegisterIndex::VelocityIntegralGain,
            GainArg::VelocityFilterGain => RegisterIndex::VelocityFilterGain,
        }
    }
}

/// Parse `MOTOR=RADIANS`
fn parse_joint_angle(s: &str) -> Result<(u8, f32), String> {
    let (motor, angle) = s
        .split_once('=')
        .ok_or_else(|| format!("expected MOTOR=RADIANS, got {:?}", s))?;
    let motor = motor
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("invalid motor id {:?}: {}", motor, e))?;
    let angle = angle
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid angle {:?}: {}", angle, e))?;
    Ok((motor, angle))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.bridge.as_deref(),
        cli.mock,
        cli.data_dir.as_deref(),
        cli.no_color,
    );

    tracing::debug!(
        arms = merged.arms.len(),
        sequence_dir = %merged.sequence_dir.display(),
        "Configuration loaded"
    );

    let format = cli
        .output
        .or_else(|| {
            config
                .output
                .as_deref()
                .and_then(|s| OutputFormat::from_str(s, true).ok())
        })
        .unwrap_or_default();
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    match &cli.command {
        Commands::Arms => {
            let service = create_service(&merged)?;
            commands::arms(&service, &ctx);
        }

        Commands::Enable { interface, motor } => {
            let service = create_service(&merged)?;
            commands::joint_action(&service, interface, *motor, JointAction::Enable, &ctx).await?;
        }

        Commands::Disable { interface, motor } => {
            let service = create_service(&merged)?;
            commands::joint_action(&service, interface, *motor, JointAction::Disable, &ctx).await?;
        }

        Commands::Clear { interface, motor } => {
            let service = create_service(&merged)?;
            commands::joint_action(&service, interface, *motor, JointAction::ClearFault, &ctx)
                .await?;
        }

        Commands::ReturnZero { interface, motor } => {
            let service = create_service(&merged)?;
            commands::joint_action(&service, interface, *motor, JointAction::ReturnZero, &ctx)
                .await?;
        }

        Commands::Zero { interface, motors } => {
            let service = create_service(&merged)?;
            commands::set_zero(&service, interface, motors, &ctx).await?;
        }

        Commands::Set { target } => {
            let service = create_service(&merged)?;
            match target {
                SetCommand::Angle {
                    interface,
                    motor,
                    value,
                } => commands::set_angle(&service, interface, *motor, *value, &ctx).await?,
                SetCommand::Speed {
                    interface,
                    motor,
                    value,
                } => commands::set_speed(&service, interface, *motor, *value, &ctx).await?,
                SetCommand::Gain {
                    interface,
                    motor,
                    gain,
                    value,
                } => {
                    commands::set_gain(&service, interface, *motor, (*gain).into(), *value, &ctx)
                        .await?
                }
            }
        }

        Commands::SetAngles { interface, angles } => {
            let service = create_service(&merged)?;
            commands::set_angles(&service, interface, angles, &ctx).await?;
        }

        Commands::SetSpeeds { interface, speeds } => {
            let service = create_service(&merged)?;
            commands::set_speeds(&service, interface, speeds, &ctx).await?;
        }

        Commands::Read { interface } => {
            let service = create_service(&merged)?;
            commands::read(&service, interface, &ctx).await?;
        }

        Commands::Record {
            interface,
            name,
            angles,
        } => {
            let service = create_service(&merged)?;
            let store = open_store(&merged)?;
            commands::record(&service, &store, interface, name, angles, &ctx).await?;
        }

        Commands::Records { interface, clear } => {
            let store = open_store(&merged)?;
            commands::records(&store, interface, *clear, &ctx)?;
        }

        Commands::Finish {
            interface,
            name,
            model,
        } => {
            let service = create_service(&merged)?;
            let store = open_store(&merged)?;
            commands::finish(&service, &store, interface, name, *model, &ctx)?;
        }

        Commands::Seq { action } => {
            let store = open_store(&merged)?;
            match action {
                SeqCommand::List => commands::list_sequences(&store, &ctx)?,
                SeqCommand::Show { name } => commands::show_sequence(&store, name, &ctx)?,
                SeqCommand::Delete { name } => commands::delete_sequence(&store, name, &ctx)?,
                SeqCommand::Merge {
                    first,
                    second,
                    name,
                    model,
                } => commands::merge_sequences(&store, first, second, name, *model, &ctx)?,
                SeqCommand::Play { interface, name } => {
                    let service = create_service(&merged)?;
                    commands::play_sequence(&service, &store, interface, name, &ctx).await?;
                }
            }
        }

        Commands::Merged { action } => {
            let store = open_store(&merged)?;
            match action {
                MergedCommand::List => commands::list_merged(&store, &ctx)?,
                MergedCommand::Play { file } => {
                    let service = create_service(&merged)?;
                    commands::play_merged(&service, &store, file, &ctx).await?;
                }
            }
        }

        Commands::RunMerged { file } => {
            let service = create_service(&merged)?;
            let store = open_store(&merged)?;
            commands::run_merged(&service, &store, file, &ctx).await?;
        }

        Commands::Hand { action } => {
            let service = create_service(&merged)?;
            match action {
                HandCommand::Fingers { side, values } => {
                    commands::hand_fingers(&service, *side, values, &ctx).await?
                }
                HandCommand::Profile {
                    side,
                    family,
                    profile,
                } => commands::hand_profile(&service, *side, *family, *profile, &ctx).await?,
            }
        }
    }

    Ok(())
}

/// Create the control service for the configured bridge and arms
fn create_service(config: &MergedConfig) -> Result<ControlService> {
    let transport = create_transport(&config.transport).context("Failed to create bridge client")?;
    let registry =
        ManipulatorRegistry::from_config(&config.arms).context("Invalid arm configuration")?;
    Ok(ControlService::new(
        transport,
        registry,
        &config.hands,
        config.control.clone(),
    ))
}

/// Open the sequence store
fn open_store(config: &MergedConfig) -> Result<SequenceStore> {
    SequenceStore::open(&config.sequence_dir).with_context(|| {
        format!(
            "Failed to open sequence store: {}",
            config.sequence_dir.display()
        )
    })
}
