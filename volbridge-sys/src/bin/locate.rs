// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use volbridge_sys::logging;
use volbridge_sys::{BridgeConfig, DiscoverySource, locate_disk};

#[derive(Debug, Parser)]
#[command(name = "volbridge-locate")]
#[command(about = "Describe a disk and the device paths of its partitions")]
struct Args {
    /// Disk device path (e.g. /dev/nvme0n1)
    disk: String,

    /// Discovery tool; overrides the configuration file
    #[arg(long, value_enum)]
    source: Option<DiscoverySource>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    json: bool,

    /// Also list unallocated regions (parted only)
    #[arg(long)]
    free: bool,
}

fn main() -> Result<()> {
    logging::init(logging::DEFAULT_DIRECTIVE);
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    if let Some(source) = args.source {
        config.discovery.source = source;
    }

    let disk = locate_disk(&config.discovery, &args.disk)
        .with_context(|| format!("locating {}", args.disk))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&disk)?);
        return Ok(());
    }

    println!(
        "{}  {}  {}  {}  {}",
        disk.path, disk.size, disk.label, disk.transport, disk.model
    );
    println!();
    println!("{:<4} {:<20} {:>12} {:<12} MOUNTS", "NUM", "PATH", "SIZE", "FS");

    for part in &disk.partitions {
        println!(
            "{:<4} {:<20} {:>12} {:<12} {}",
            part.number,
            part.path.as_deref().unwrap_or("-"),
            part.size,
            part.filesystem.as_deref().unwrap_or("-"),
            part.mount_points.join(",")
        );
    }

    if args.free {
        println!();
        let regions = disk.free_regions()?;
        if regions.is_empty() {
            println!("  (no free space)");
        }
        for region in regions {
            println!(
                "  free {:>10.2}MiB .. {:>10.2}MiB ({:.2}MiB)",
                region.start_mib,
                region.end_mib,
                region.len_mib()
            );
        }
    }

    Ok(())
}
