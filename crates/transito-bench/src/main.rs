//! Benchmark for transito serialization using synthetic city records.
//!
//! Builds a batch of records exercising most built-in types, then times
//! writing and reading in each format and checks that every round trip is
//! lossless.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use transito::{BigDecimal, Format, Link, LinkRender, Reader, Timestamp, Uri, Value, Writer};

const TIMEZONES: [&str; 6] = [
    "europe-paris",
    "america-new-york",
    "asia-tokyo",
    "africa-lagos",
    "australia-sydney",
    "america-sao-paulo",
];

const TAGS: [&str; 5] = ["capital", "coastal", "historic", "metro", "port"];

const ITERS: u32 = 10;

// =============================================================================
// SYNTHETIC DATA
// =============================================================================

fn city_id(id: u32) -> Uuid {
    Uuid::from_u128(0xc1b2_c3d4_e5f6_0718_2930_4050_0000_0000 | id as u128)
}

fn build_city(id: u32) -> Value {
    let name = format!("City {}", id);
    let lat = (id as f64 * 0.37) % 180.0 - 90.0;
    let lon = (id as f64 * 0.73) % 360.0 - 180.0;
    let tags: Vec<Value> = TAGS
        .iter()
        .enumerate()
        .filter(|(i, _)| (id as usize + i) % 3 == 0)
        .map(|(_, t)| Value::keyword(*t))
        .collect();
    let area: BigDecimal = format!("{}.{:02}", 10 + id % 900, id % 100)
        .parse()
        .expect("valid decimal literal");
    let wiki = Link::new(Uri::new(format!("https://en.wikipedia.org/wiki/City_{}", id)), "wiki")
        .with_name(name.clone())
        .with_render(LinkRender::Link);

    Value::map([
        (Value::keyword("id"), Value::from(city_id(id))),
        (Value::keyword("name"), Value::from(name)),
        (Value::keyword("population"), Value::from(id as i64 * 1_237 % 9_000_000)),
        (Value::keyword("location"), Value::array([lat, lon])),
        (Value::keyword("area"), Value::from(area)),
        (Value::keyword("timezone"), Value::keyword(TIMEZONES[id as usize % TIMEZONES.len()])),
        (Value::keyword("founded"), Value::from(Timestamp::from_millis(-2_000_000_000_000 + id as i64 * 86_400_000))),
        (Value::keyword("tags"), Value::Set(tags)),
        (Value::keyword("homepage"), Value::from(Uri::new(format!("https://city{}.example.org", id)))),
        (Value::keyword("wiki"), Value::from(wiki)),
    ])
}

fn build_batch(count: u32) -> Value {
    Value::array((0..count).map(build_city))
}

// =============================================================================
// BENCHMARK
// =============================================================================

fn throughput(bytes: usize, elapsed: Duration) -> f64 {
    (bytes as f64 / 1_000_000.0) / elapsed.as_secs_f64()
}

fn bench_format(format: Format, batch: &Value) -> Vec<u8> {
    let writer = Writer::new(format);
    let reader = Reader::new(format);

    // Warmup
    let encoded = writer.write(batch).expect("Failed to encode");

    let encode_start = Instant::now();
    for _ in 0..ITERS {
        let bytes = writer.write(batch).expect("Failed to encode");
        assert_eq!(bytes.len(), encoded.len());
    }
    let encode_time = encode_start.elapsed() / ITERS;

    let decode_start = Instant::now();
    let mut decoded = None;
    for _ in 0..ITERS {
        decoded = Some(reader.read(&encoded).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / ITERS;
    assert_eq!(decoded.as_ref(), Some(batch), "{} round trip must be lossless", format);

    println!("\n{}: {} bytes", format, encoded.len());
    println!(
        "  Encode: {:?} ({:.2} MB/s)",
        encode_time,
        throughput(encoded.len(), encode_time)
    );
    println!(
        "  Decode: {:?} ({:.2} MB/s)",
        decode_time,
        throughput(encoded.len(), decode_time)
    );
    info!(format = %format, bytes = encoded.len(), ?encode_time, ?decode_time, "benchmarked format");

    encoded
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let count: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);

    let build_start = Instant::now();
    let batch = build_batch(count);
    println!("Built {} city records in {:?}", count, build_start.elapsed());

    let mut sizes = Vec::new();
    for format in [Format::Json, Format::JsonVerbose, Format::MessagePack] {
        let encoded = bench_format(format, &batch);
        sizes.push((format, encoded));
    }

    let out_dir = Path::new("out");
    fs::create_dir_all(out_dir).expect("Failed to create output directory");

    println!("\n=== Output Files ===");
    for (format, bytes) in &sizes {
        let ext = match format {
            Format::Json => "json",
            Format::JsonVerbose => "verbose.json",
            Format::MessagePack => "msgpack",
        };
        let path = out_dir.join(format!("cities.{}", ext));
        fs::write(&path, bytes).expect("Failed to write output file");
        println!("{}: {}", format, path.display());
    }

    println!("\n=== Summary ===");
    let verbose_len = sizes
        .iter()
        .find(|(f, _)| *f == Format::JsonVerbose)
        .map(|(_, b)| b.len())
        .unwrap_or(1);
    for (format, bytes) in &sizes {
        println!(
            "{}: {} bytes ({:.1}% of verbose JSON)",
            format,
            bytes.len(),
            100.0 * bytes.len() as f64 / verbose_len as f64
        );
    }
}
