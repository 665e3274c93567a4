//! Replay a short route at a few speeds, printing the marker as it moves.
//!
//! Run with: cargo run --example replay_route

use std::time::{Duration, Instant};

use route_replay::{FrameOutcome, GpsPoint, PlaybackController, PlaybackState};

fn main() {
    // A loop around a London block
    let route = vec![
        GpsPoint::new(51.5074, -0.1278), // Start
        GpsPoint::new(51.5080, -0.1290),
        GpsPoint::new(51.5090, -0.1300),
        GpsPoint::new(51.5100, -0.1310),
        GpsPoint::new(51.5110, -0.1320), // End
    ];

    let mut playback = PlaybackController::new(route);

    println!("Route Replay Example\n");
    println!("Route: {} points, {:.0}m", playback.points().len(), playback.profile().total_distance);
    println!("At 1x this takes {:.1}s\n", playback.estimated_duration().as_secs_f64());

    // Simulated clock: one frame every 250ms of "real" time
    let frame = Duration::from_millis(250);
    let mut now = Instant::now();

    playback.set_observer(|state: &PlaybackState| {
        if let Some(p) = state.current_position {
            println!(
                "  {:>5.1}%  ({:.5}, {:.5})  heading {:>5.1}  {}",
                state.progress * 100.0,
                p.latitude,
                p.longitude,
                state.current_heading,
                if state.is_playing { "playing" } else { "idle" },
            );
        }
    });

    println!("1. Play at 4x:");
    playback.set_speed(4.0).unwrap();
    playback.play();
    while let Some(outcome) = playback.tick(now) {
        if outcome == FrameOutcome::Finished {
            break;
        }
        now += frame;
    }

    println!("\n2. Scrub to 25% and 75%:");
    playback.seek(0.25).unwrap();
    playback.seek(0.75).unwrap();

    println!("\n3. Play again from the end (restarts), pause after a second:");
    playback.seek(1.0).unwrap();
    playback.play();
    for _ in 0..5 {
        playback.tick(now);
        now += frame;
    }
    playback.pause();

    println!("\n4. Invalid speed is rejected:");
    if let Err(e) = playback.set_speed(-2.0) {
        println!("  {}", e);
    }
}
