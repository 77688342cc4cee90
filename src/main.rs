use std::io::{stdout, Write};

use gtfs_structures::Gtfs;

use raptor::feed::{FeedView, StopIdx};
use raptor::journey::Journey;
use raptor::round::{search, SearchConfig};
use raptor::utils;

const DEFAULT_TRANSFER_LIMIT: u32 = 8;

fn get_stop_from_user(feed: &FeedView, prompt: &str) -> std::io::Result<StopIdx> {
    loop {
        print!("Where are you {prompt}? ");
        stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let query = input.trim().to_lowercase();
        if let Some(idx) = (0..feed.num_stops() as StopIdx).find(|&i| feed.stop(i).name.to_lowercase().contains(&query)) {
            return Ok(idx);
        }
        println!("Stop not found. Please try again.");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gtfs = Gtfs::new("../gtfs/2/google_transit.zip")?;

    println!(
        "GTFS loaded with {} stops, {} routes, and {} trips.",
        gtfs.stops.len(),
        gtfs.routes.len(),
        gtfs.trips.len()
    );
    println!();

    let mut feed = FeedView::from_gtfs(&gtfs)?;
    match std::fs::File::open("../gtfs/2/transfers.txt") {
        Ok(file) => feed.load_transfers(file)?,
        Err(_) => println!("No transfers.txt found; walking transfers are disabled."),
    }

    loop {
        let start = get_stop_from_user(&feed, "starting")?;
        let departure_time = loop {
            let mut time_str = String::new();
            print!("What time are you starting? (HH:MM): ");
            stdout().flush()?;
            std::io::stdin().read_line(&mut time_str)?;
            let mut time_str = String::from(time_str.trim_end());
            time_str += ":00";
            match utils::parse_time(&time_str) {
                Ok(time) => break time,
                Err(e) => {
                    println!("Invalid time format: {e:?}. Please try again.");
                }
            }
        };
        let end = get_stop_from_user(&feed, "going")?;

        println!();
        println!("Start: {} at time {}", feed.stop(start).name, utils::get_time_str(departure_time));
        println!("End: {}", feed.stop(end).name);
        println!();

        let config = SearchConfig::new(DEFAULT_TRANSFER_LIMIT, departure_time);
        let query_start = std::time::Instant::now();
        let store = search(&feed, start, config);
        let query_end = std::time::Instant::now();
        println!("Query took {}μs.", (query_end - query_start).as_micros());

        match Journey::reconstruct(&feed, &store, end, departure_time) {
            Ok(journey) => println!("{journey}"),
            Err(e) => println!("No journey found: {e}"),
        }
        println!();
    }
}
