use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "elec-cli", author, version, about = "Panel load schedules and PEC 2017 checks", long_about = None)]
pub struct Cli {
    /// TOML configuration file (analysis parameters, schedule defaults)
    #[arg(long, global = true, default_value = "panelbook.toml")]
    pub config: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty schedule file using the configured defaults
    New {
        /// Schedule file to create
        path: PathBuf,
        /// Panel name
        #[arg(long)]
        panel: String,
        /// System voltage (V); defaults to the configured value
        #[arg(long)]
        voltage: Option<f64>,
        /// "single" or "three"; defaults to the configured value
        #[arg(long)]
        system: Option<String>,
    },
    /// Append a load item to a schedule file
    Add {
        path: PathBuf,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Unit rating (W)
        #[arg(long)]
        rating: f64,
        #[arg(long, default_value_t = 1.0)]
        demand_factor: f64,
        #[arg(long, value_enum, default_value_t = PhaseArg::A)]
        phase: PhaseArg,
        /// Breaker rating (A)
        #[arg(long)]
        breaker: Option<f64>,
        /// Conductor size (mm²)
        #[arg(long)]
        conductor: Option<f64>,
        /// Circuit length (m)
        #[arg(long)]
        length: Option<f64>,
        /// Identifier recorded in the lock file
        #[arg(long, default_value = "elec-cli")]
        user: String,
    },
    /// Remove a load item from a schedule file
    Remove {
        path: PathBuf,
        /// Item UUID or 1-based position
        #[arg(long)]
        item: String,
        #[arg(long, default_value = "elec-cli")]
        user: String,
    },
    /// Totals, compliance and phase balance of a schedule
    Analyze {
        path: PathBuf,
        /// Store per-item results back into the file
        #[arg(long)]
        write: bool,
    },
    /// Phase balance of a three-phase schedule
    Balance { path: PathBuf },
    /// Economic conductor size comparison for one item
    Size {
        path: PathBuf,
        /// Item UUID or 1-based position
        #[arg(long)]
        item: String,
        /// Candidate sizes in mm² (default: all standard sizes)
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<f64>,
    },
    /// Voltage drop of a single circuit
    Vdrop {
        /// Load current (A)
        #[arg(long)]
        current: f64,
        /// One-way length (m)
        #[arg(long)]
        length: f64,
        /// Conductor size (mm²)
        #[arg(long)]
        size: f64,
        #[arg(long, default_value_t = 230.0)]
        voltage: f64,
        /// Three-phase system
        #[arg(long)]
        three_phase: bool,
        #[arg(long, default_value_t = 1)]
        poles: usize,
        /// Drop limit (%)
        #[arg(long, default_value_t = 3.0)]
        limit: f64,
        /// "cu" or "al"; defaults to the configured material
        #[arg(long)]
        material: Option<String>,
    },
    /// Breaker and conductor for a load current
    Recommend {
        /// Load current (A)
        #[arg(long)]
        current: f64,
        /// "cu" or "al"; defaults to the configured material
        #[arg(long)]
        material: Option<String>,
    },
    /// Saved calculations
    Saved {
        /// Store directory
        #[arg(long, default_value = "saved")]
        store: PathBuf,
        #[command(subcommand)]
        command: SavedCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SavedCommands {
    /// List saved calculations, newest first
    List,
    /// Print one saved calculation
    Show { id: String },
    /// Delete one saved calculation
    Delete { id: String },
    /// Save a schedule file as a calculation snapshot
    Put {
        path: PathBuf,
        #[arg(long)]
        name: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    A,
    B,
    C,
    Ab,
    Bc,
    Ca,
    Abc,
}

impl From<PhaseArg> for elec_core::schedule::PhaseAssignment {
    fn from(arg: PhaseArg) -> Self {
        use elec_core::schedule::PhaseAssignment;
        match arg {
            PhaseArg::A => PhaseAssignment::A,
            PhaseArg::B => PhaseAssignment::B,
            PhaseArg::C => PhaseAssignment::C,
            PhaseArg::Ab => PhaseAssignment::AB,
            PhaseArg::Bc => PhaseAssignment::BC,
            PhaseArg::Ca => PhaseAssignment::CA,
            PhaseArg::Abc => PhaseAssignment::ABC,
        }
    }
}
