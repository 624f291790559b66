use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const NUM_POINTS: usize = 500;
const NUM_EDGES: usize = 2000;
/// More communities than categorical buckets, so counts get an `_other` bucket.
const NUM_COMMUNITIES: usize = 40;
const FIRST_SEEN_BASE_MS: i64 = 1_600_000_000_000;

fn main() {
    let mut rng = SimpleRng::new(42);

    // ---- Points ----
    let mut titles = Vec::with_capacity(NUM_POINTS);
    let mut communities = Vec::with_capacity(NUM_POINTS);
    let mut scores = Vec::with_capacity(NUM_POINTS);
    let mut first_seen = Vec::with_capacity(NUM_POINTS);
    let mut colors = Vec::with_capacity(NUM_POINTS);

    for i in 0..NUM_POINTS {
        // Skewed community sizes: low ids are much more common.
        let community = rng.below(NUM_COMMUNITIES).min(rng.below(NUM_COMMUNITIES));
        titles.push(format!("host%2D{i:04}"));
        communities.push(format!("community-{community}"));
        scores.push(rng.gauss(50.0, 15.0));
        first_seen.push(FIRST_SEEN_BASE_MS + rng.below(365) as i64 * 86_400_000);
        colors.push(community as i64);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("pointTitle", DataType::Utf8, false),
        Field::new("community", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
        Field::new("firstSeenDate", DataType::Int64, false),
        Field::new("pointColor", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(communities)),
            Arc::new(Float64Array::from(scores)),
            Arc::new(Int64Array::from(first_seen)),
            Arc::new(Int64Array::from(colors)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let points_path = "sample_points.parquet";
    let file = std::fs::File::create(points_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // ---- Edges (columnar JSON) ----
    let protocols = ["tcp", "udp", "icmp"];
    let mut edge_titles = Vec::with_capacity(NUM_EDGES);
    let mut weights = Vec::with_capacity(NUM_EDGES);
    let mut edge_protocols = Vec::with_capacity(NUM_EDGES);
    for _ in 0..NUM_EDGES {
        let src = rng.below(NUM_POINTS);
        let dst = rng.below(NUM_POINTS);
        edge_titles.push(format!("{src}->{dst}"));
        weights.push(rng.gauss(3.0, 1.0).abs().round() as i64);
        edge_protocols.push(protocols[rng.below(protocols.len())]);
    }

    let edges = json!({
        "edge": { "type": "string", "values": edge_titles },
        "weight": { "type": "number", "values": weights },
        "protocol": { "type": "string", "values": edge_protocols }
    });
    let edges_path = "sample_edges.json";
    let file = std::fs::File::create(edges_path).expect("Failed to create output file");
    serde_json::to_writer(file, &edges).expect("Failed to write edges");

    println!("Wrote {NUM_POINTS} points to {points_path} and {NUM_EDGES} edges to {edges_path}");
}
