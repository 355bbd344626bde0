//! Fill one page of grid slots from the network and report progress.
//!
//! ```sh
//! cargo run --example grid
//! cargo run --example grid -- --page 35 --base https://picsum.photos/100/100
//! ```

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use photoboard::{display_channel, BoardOptions, ImageGrid, SlotContent};

struct Args {
    base_url: String,
    count: usize,
    page: usize,
    timeout_secs: u64,
}

fn parse_args() -> Args {
    let defaults = BoardOptions::default();
    let mut args = Args {
        base_url: defaults.base_url,
        count: defaults.initial_count,
        page: 70,
        timeout_secs: 30,
    };

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--base" => {
                i += 1;
                args.base_url = raw[i].clone();
            }
            "--count" => {
                i += 1;
                args.count = raw[i].parse().expect("invalid --count");
            }
            "--page" => {
                i += 1;
                args.page = raw[i].parse().expect("invalid --page");
            }
            "--timeout" => {
                i += 1;
                args.timeout_secs = raw[i].parse().expect("invalid --timeout");
            }
            "-h" | "--help" => {
                eprintln!(
                    "photoboard grid demo

Usage: cargo run --example grid -- [options]

Options:
  --base <url>       Base image URL (default: {})
  --count <n>        Identifiers per reload (default: {})
  --page <n>         Slots to fill (default: 70)
  --timeout <secs>   Give up waiting after this long (default: 30)
  -h, --help         Show this help",
                    photoboard::config::DEFAULT_BASE_URL,
                    photoboard::config::DEFAULT_INITIAL_COUNT,
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }
    args
}

#[tokio::main]
async fn main() -> photoboard::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photoboard=info".into()),
        )
        .init();

    let args = parse_args();
    let options = BoardOptions {
        base_url: args.base_url,
        initial_count: args.count,
        ..Default::default()
    };

    let (display, mut queue) = display_channel();
    let mut grid = ImageGrid::with_http(&options, tokio::runtime::Handle::current(), display)?;
    grid.reload_all();

    let slots: Vec<_> = (0..args.page.min(grid.len()))
        .filter_map(|position| grid.dequeue_slot(position))
        .collect();

    let bar = ProgressBar::new(slots.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} images ({elapsed})")
            .unwrap()
            .progress_chars("=> "),
    );

    let start = Instant::now();
    let deadline = tokio::time::sleep(Duration::from_secs(args.timeout_secs));
    tokio::pin!(deadline);

    let ready = |grid: &ImageGrid<_>| {
        slots
            .iter()
            .filter(|&&key| matches!(grid.slot(key).map(|s| s.content), Some(SlotContent::Ready(_))))
            .count()
    };

    loop {
        let done = ready(&grid);
        bar.set_position(done as u64);
        if done == slots.len() {
            break;
        }
        tokio::select! {
            _ = queue.run_next() => {}
            _ = &mut deadline => break,
        }
    }
    bar.finish();

    let done = ready(&grid);
    println!(
        "{done}/{} slots filled in {:.1}s, {} images cached",
        slots.len(),
        start.elapsed().as_secs_f64(),
        grid.cache().len()
    );
    Ok(())
}
