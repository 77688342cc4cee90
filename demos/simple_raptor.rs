use raptor::Journey;

use dev_utils::get_example_scenario;

fn main() {
    let (feed, start, departure_time, end, config) = get_example_scenario();
    println!(
        "Synthetic feed loaded with {} stops, {} routes, {} trips.",
        feed.num_stops(),
        feed.routes.len(),
        feed.trips.len()
    );

    let store = raptor::search(&feed, start, config);
    match Journey::reconstruct(&feed, &store, end, departure_time) {
        Ok(journey) => println!("{journey}"),
        Err(e) => println!("No journey found: {e}"),
    }
}
