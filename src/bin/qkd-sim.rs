use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qkd_attack_sim::protocols::qkd::{bb84::PnsResult, decoy::DecoyResult, sarg04::TrojanHorseResult};
use qkd_attack_sim::{Simulation, SimulationConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Longest key prefix printed before truncating.
const KEY_PREVIEW: usize = 64;

const DEFAULT_SARG04_LENGTH_KM: f64 = 80.0;

#[derive(Parser)]
#[command(name = "qkd-sim", about = "Simulates eavesdropping attacks on weak-pulse QKD")]
struct Cli {
    /// TOML file with run parameters
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Overrides {
    /// Mean photon number of the signal pulses
    #[arg(long)]
    mu: Option<f64>,
    /// Detector efficiency
    #[arg(long)]
    eta: Option<f64>,
    /// Pulses emitted by the sender
    #[arg(short = 'n', long)]
    bits: Option<usize>,
    /// Fibre attenuation in dB/km
    #[arg(long)]
    alpha: Option<f64>,
    /// Fibre length in km
    #[arg(short, long)]
    length: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// BB84 under a photon-number-splitting attack
    Bb84Pns,
    /// Decoy-state BB84 with and without a PNS attacker
    Decoy {
        #[arg(long)]
        decoy_mu: Option<f64>,
        #[arg(long)]
        decoy_percent: Option<u32>,
        #[arg(long)]
        signal_percent: Option<u32>,
    },
    /// SARG04 under a Trojan-horse attack
    Sarg04,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    match cli.command {
        Commands::Bb84Pns => {
            let result = Simulation::new(config)?.run_bb84_pns()?;
            report_pns(&result);
        }
        Commands::Decoy {
            decoy_mu,
            decoy_percent,
            signal_percent,
        } => {
            if let Some(mu) = decoy_mu {
                config.decoy.mean_photon_number = mu;
            }
            if let Some(p) = decoy_percent {
                config.decoy.decoy_percent = p;
            }
            if let Some(p) = signal_percent {
                config.decoy.signal_percent = p;
            }
            let result = Simulation::new(config)?.run_decoy()?;
            report_decoy(&result);
        }
        Commands::Sarg04 => {
            if config.fiber_length_km.is_none() {
                config.fiber_length_km = Some(DEFAULT_SARG04_LENGTH_KM);
            }
            let result = Simulation::new(config)?.run_sarg04_trojan()?;
            report_trojan(&result);
        }
    }
    Ok(())
}

fn apply_overrides(config: &mut SimulationConfig, cli: &Cli) {
    let o = &cli.overrides;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(mu) = o.mu {
        config.mean_photon_number = mu;
    }
    if let Some(eta) = o.eta {
        config.detector_efficiency = eta;
    }
    if let Some(n) = o.bits {
        config.bits_sent = n;
    }
    if let Some(alpha) = o.alpha {
        config.attenuation_db_per_km = alpha;
    }
    if o.length.is_some() {
        config.fiber_length_km = o.length;
    }
}

fn preview<T: ToString>(key: &[T]) -> String {
    let mut s: String = key.iter().take(KEY_PREVIEW).map(|b| b.to_string()).collect();
    if key.len() > KEY_PREVIEW {
        s.push_str("...");
    }
    s
}

fn bits(key: &[bool]) -> String {
    preview(&key.iter().map(|&b| u8::from(b)).collect::<Vec<_>>())
}

fn percent(x: f64) -> String {
    format!("{:.2}%", 100.0 * x)
}

fn report_pns(r: &PnsResult) {
    println!("== BB84 under PNS attack ==");
    println!("multi-photon pulses : {}", r.multi_photon_pulses);
    println!("detected pulses     : {}", r.surviving);
    if let Some(l) = r.critical_length_km {
        println!("critical length     : {l:.2} km");
    }
    println!("sifted key length   : {}", r.sifted_length);
    println!("sender key   ({:>4}) : {}", r.sender_key.len(), bits(&r.sender_key));
    println!("receiver key ({:>4}) : {}", r.receiver_key.len(), bits(&r.receiver_key));
    println!("attacker key ({:>4}) : {}", r.eve_key.len(), bits(&r.eve_key));
    println!("QBER                : {}", percent(r.qber));
    println!(
        "attacker holds the full key: {}",
        r.eve_key == r.sender_key
    );
}

fn report_decoy(r: &DecoyResult) {
    let a = &r.attack;
    let b = &r.baseline;
    println!("== Decoy-state BB84 ==");
    println!(
        "emitted             : {} decoy, {} signal",
        r.emitted.decoy, r.emitted.signal
    );
    println!(
        "detected (attack)   : {} decoy, {} signal",
        a.surviving.decoy, a.surviving.signal
    );
    println!(
        "detected (honest)   : {} decoy, {} signal over {:.2} dB",
        b.surviving.decoy, b.surviving.signal, b.loss_db
    );
    println!("tagged key          : {}", preview(&a.sender_tagged_key));
    println!("sender key   ({:>4}) : {}", a.sender_key.len(), bits(&a.sender_key));
    println!("receiver key ({:>4}) : {}", a.receiver_key.len(), bits(&a.receiver_key));
    println!("attacker key ({:>4}) : {}", a.eve_key.len(), bits(&a.eve_key));
    println!("QBER                : {}", percent(a.qber));
    println!(
        "yield under attack  : decoy {}, signal {}",
        percent(a.yields.decoy),
        percent(a.yields.signal)
    );
    println!(
        "yield honest        : decoy {}, signal {}",
        percent(b.yields.decoy),
        percent(b.yields.signal)
    );
    if r.verdict.attack_detected {
        println!(
            "PNS attack detected: decoy yield {} above the honest channel",
            percent(r.verdict.deviation)
        );
    } else {
        println!("no PNS attack detected");
    }
}

fn report_trojan(r: &TrojanHorseResult) {
    println!("== SARG04 under Trojan-horse attack ==");
    println!(
        "fibre               : {:.1} km, {:.2} dB",
        r.link.length_km,
        r.link.loss_db()
    );
    println!("detected pulses     : {}", r.surviving);
    println!("announced sets      : {}", preview(&r.sets));
    println!("sifted key length   : {}", r.sifted_length);
    println!("sender key   ({:>4}) : {}", r.sender_key.len(), bits(&r.sender_key));
    println!("receiver key ({:>4}) : {}", r.receiver_key.len(), bits(&r.receiver_key));
    println!("attacker key ({:>4}) : {}", r.eve_key.len(), bits(&r.eve_key));
    println!("QBER                : {}", percent(r.qber));
    println!(
        "attacker holds the full key: {}",
        r.eve_key == r.sender_key
    );
}
