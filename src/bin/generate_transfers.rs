// Standalone tool mirroring the original `update_transfers` CLI entry point: load a GTFS feed,
// derive a walking-transfer table from stop proximity, and write it out in `transfers.txt` form.

use std::fs::File;
use std::path::PathBuf;

use gtfs_structures::Gtfs;

use raptor::feed::FeedView;
use raptor::transfer_gen::{generate_transfers, write_transfers_csv, TransferGenConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let gtfs_path = args.next().ok_or("usage: generate_transfers <gtfs-path-or-zip> [out-path]")?;
    let out_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("transfers.txt"));

    let gtfs = Gtfs::new(&gtfs_path)?;
    let feed = FeedView::from_gtfs(&gtfs)?;

    let config = TransferGenConfig::default();
    let transfers = generate_transfers(&feed, &config);
    log::info!("generated {} candidate transfers within {}m", transfers.len(), config.radius_m);

    let file = File::create(&out_path)?;
    write_transfers_csv(&feed, &transfers, file)?;
    println!("wrote {} transfers to {}", transfers.len(), out_path.display());

    Ok(())
}
