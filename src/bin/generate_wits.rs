//! Dummy WITS Data Generator
//!
//! Writes a record store the bit grade engine can run against:
//! - `wits.json`: telemetry, one record per second, drill strings in sequence
//! - `ds_data.json`: drill string to motor links
//! - `dhm_data.json`: motor coefficients
//!
//! # Usage
//! ```bash
//! ./generate-wits --out ./resources --drill-strings 3 --points 1000 --seed 7
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Uniform};
use serde_json::{json, Value};

use bitgrade::config::defaults::DEFAULT_PROVIDER;
use bitgrade::types::Activity;

// ============================================================================
// Channel Ranges
// ============================================================================

/// Measured depth span covered by each drill string (ft)
const DEPTH_PER_STRING: f64 = 10_000.0;
/// Weight on bit (lbf)
const WOB_RANGE: (f64, f64) = (0.0, 50_000.0);
/// Rotary speed (rpm)
const RPM_RANGE: (f64, f64) = (0.0, 350.0);
/// Rate of penetration (ft/min)
const ROP_RANGE: (f64, f64) = (0.0, 300.0);
/// Flow rate (gpm)
const FLOWRATE_RANGE: (f64, f64) = (0.0, 500.0);
/// Motor coefficient
const MOTOR_COF_RANGE: (f64, f64) = (0.0, 500.0);

#[derive(Parser, Debug)]
#[command(name = "generate-wits")]
#[command(about = "Generate dummy WITS, drill string and motor collections")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "./resources")]
    out: PathBuf,

    /// Number of drill strings (ds_1 .. ds_n)
    #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=100))]
    drill_strings: u32,

    /// WITS records per drill string
    #[arg(short, long, default_value = "1000", value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    points: u32,

    /// Timestamp just before the first record
    #[arg(long, default_value = "1677112068")]
    start_ts: i64,

    /// Asset id stamped on every WITS record
    #[arg(long, default_value = "123456789")]
    asset_id: i64,

    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

struct Dataset {
    wits: Vec<Value>,
    drill_strings: Vec<Value>,
    motors: Vec<Value>,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn uniform(range: (f64, f64)) -> Uniform<f64> {
    Uniform::new(range.0, range.1)
}

fn generate(args: &Args, rng: &mut StdRng) -> Dataset {
    let wob = uniform(WOB_RANGE);
    let rpm = uniform(RPM_RANGE);
    let rop = uniform(ROP_RANGE);
    let flowrate = uniform(FLOWRATE_RANGE);
    let motor_cof = uniform(MOTOR_COF_RANGE);

    let points = i64::from(args.points);
    let mut wits = Vec::new();
    let mut drill_strings = Vec::new();
    let mut motors = Vec::new();

    for n in 1..=args.drill_strings {
        let ds_id = format!("ds_{n}");
        let motor_id = format!("motor_id_{n}");
        let offset = i64::from(n - 1) * points;

        // md rises linearly through this string's depth band
        let md_start = f64::from(n - 1) * DEPTH_PER_STRING;
        let md_step = DEPTH_PER_STRING / f64::from(args.points);

        for i in 1..=points {
            let activity = Activity::ALL[rng.gen_range(0..Activity::ALL.len())];
            wits.push(json!({
                "timestamp": args.start_ts + offset + i,
                "provider": DEFAULT_PROVIDER,
                "drill_string_id": ds_id,
                "asset_id": args.asset_id,
                "activity": activity.as_str(),
                "data": {
                    "md": round3(md_start + md_step * i as f64),
                    "wob": round3(wob.sample(rng)),
                    "rpm": round3(rpm.sample(rng)),
                    "rop": round3(rop.sample(rng)),
                    "flowrate": round3(flowrate.sample(rng)),
                }
            }));
        }

        drill_strings.push(json!({
            "_drill_string_id": ds_id,
            "down_hole_motor_id": motor_id,
        }));
        motors.push(json!({
            "motor_id": motor_id,
            "motor_cof": round3(motor_cof.sample(rng)),
        }));
    }

    Dataset {
        wits,
        drill_strings,
        motors,
    }
}

fn write_collection(dir: &Path, name: &str, records: &[Value]) -> Result<()> {
    let path = dir.join(format!("{name}.json"));
    let contents = serde_json::to_string_pretty(records)?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  {} ({} records)", path.display(), records.len());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let dataset = generate(&args, &mut rng);
    println!("Writing dummy data to {}", args.out.display());
    write_collection(&args.out, "wits", &dataset.wits)?;
    write_collection(&args.out, "ds_data", &dataset.drill_strings)?;
    write_collection(&args.out, "dhm_data", &dataset.motors)?;
    Ok(())
}
