use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use endpoint::{Endpoint, EndpointConfig, MetavoxelClient, MetavoxelSession, PeerId};
use log::{debug, info};
use metavoxel::{MetavoxelData, MetavoxelLod, Voxel, VoxelKey};
use serde::Serialize;

type Client = Endpoint<MetavoxelClient, VecDeque<Vec<u8>>>;
type Server = Endpoint<MetavoxelSession, VecDeque<Vec<u8>>>;

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic lossy loopback simulation"
)]
struct Cli {
    /// Number of ticks to simulate over the lossy link.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// Probability that a datagram is dropped, in each direction.
    #[arg(long, default_value_t = 0.2)]
    loss: f64,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated milliseconds per tick (drives the update cadence).
    #[arg(long, default_value_t = 16)]
    tick_millis: u64,
    /// Cells changed in the world per tick.
    #[arg(long, default_value_t = 4)]
    edits_per_tick: u32,
    /// Deepest octree level edited.
    #[arg(long, default_value_t = 2)]
    max_depth: u8,
    /// Ticks between client LOD moves.
    #[arg(long, default_value_t = 25)]
    move_every: u32,
    /// Lossless ticks allowed for convergence after the lossy phase.
    #[arg(long, default_value_t = 60)]
    settle_ticks: u32,
    /// Endpoint configuration (JSON) shared by both sides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write a JSON summary here.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fail if p95 server datagram size exceeds this value.
    #[arg(long)]
    max_p95_datagram_bytes: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    anyhow::ensure!((0.0..1.0).contains(&cli.loss), "loss must be in [0, 1)");
    anyhow::ensure!(
        cli.max_depth <= metavoxel::MAX_DEPTH,
        "max depth must be at most {}",
        metavoxel::MAX_DEPTH
    );

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EndpointConfig::default(),
    };

    let mut rng = Rng::new(cli.seed);
    let mut world = MetavoxelData::with_size(16.0).context("create world")?;
    let mut client: Client = Endpoint::new(
        PeerId::new(1),
        MetavoxelClient::new(MetavoxelLod::new([0.0; 3], 1.0)),
        VecDeque::new(),
        config.clone(),
    );
    let mut server: Server = Endpoint::new(
        PeerId::new(0),
        MetavoxelSession::new(world.clone()),
        VecDeque::new(),
        config,
    );

    let mut summary = Summary::new(&cli);
    let start = Instant::now();
    let mut now = start;

    for tick in 1..=cli.ticks {
        now = start + Duration::from_millis(u64::from(tick) * cli.tick_millis);
        step_world(&mut world, &mut rng, cli.edits_per_tick, cli.max_depth);
        server.role_mut().set_data(world.clone());
        if cli.move_every > 0 && tick % cli.move_every == 0 {
            let lod = random_lod(&mut rng, world.size());
            debug!("tick {tick}: client moves to {lod:?}");
            client.role_mut().set_lod(lod);
        }
        exchange(&mut client, &mut server, now, &mut rng, cli.loss, &mut summary)?;
        summary.observe(&client, &server);
    }

    let mut settled_after = None;
    for tick in 1..=cli.settle_ticks {
        now += Duration::from_millis(cli.tick_millis);
        exchange(&mut client, &mut server, now, &mut rng, 0.0, &mut summary)?;
        if converged(&client, &server) {
            settled_after = Some(tick);
            break;
        }
    }

    summary.settled_after = settled_after;
    summary.finalize();
    info!(
        "client {} / server {} datagrams sent, {} dropped, p95 server datagram {} bytes",
        summary.client_datagrams, summary.server_datagrams, summary.dropped, summary.p95_server_bytes
    );
    if let Some(path) = &cli.out {
        write_summary_json(path, &summary)?;
    }

    let settled = settled_after.context("client did not converge to the server's visible data")?;
    info!("converged after {settled} lossless ticks");
    summary.assert_budget(cli.max_p95_datagram_bytes)?;
    Ok(())
}

fn load_config(path: &Path) -> Result<EndpointConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn write_summary_json(path: &Path, summary: &Summary) -> Result<()> {
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// One update on each side, client first, each followed by delivery.
fn exchange(
    client: &mut Client,
    server: &mut Server,
    now: Instant,
    rng: &mut Rng,
    loss: f64,
    summary: &mut Summary,
) -> Result<()> {
    client.update_at(now).context("client update")?;
    while let Some(datagram) = client.sink_mut().pop_front() {
        summary.client_datagrams += 1;
        if rng.chance(loss) {
            summary.dropped += 1;
            continue;
        }
        server.parse_data(&datagram).context("server parse")?;
    }

    server.update_at(now).context("server update")?;
    while let Some(datagram) = server.sink_mut().pop_front() {
        summary.server_datagrams += 1;
        summary.server_sizes.push(datagram.len() as u64);
        if rng.chance(loss) {
            summary.dropped += 1;
            continue;
        }
        client.parse_data(&datagram).context("client parse")?;
    }
    Ok(())
}

fn converged(client: &Client, server: &Server) -> bool {
    let lod = client.role().lod();
    server.role().lod() == lod
        && client.role().data_lod() == lod
        && client.role().data() == &server.role().data().visible_subset(lod)
}

fn step_world(world: &mut MetavoxelData, rng: &mut Rng, edits: u32, max_depth: u8) {
    for _ in 0..edits {
        let depth = (rng.next_u32() % (u32::from(max_depth) + 1)) as u8;
        let extent = 1u32 << depth;
        let Ok(key) = VoxelKey::new(
            depth,
            rng.next_u32() % extent,
            rng.next_u32() % extent,
            rng.next_u32() % extent,
        ) else {
            continue;
        };
        if rng.next_u32() % 4 == 0 {
            world.remove(&key);
        } else {
            world.set(key, Voxel(rng.next_u32() % 4096));
        }
    }
}

fn random_lod(rng: &mut Rng, size: f32) -> MetavoxelLod {
    let mut position = [0.0f32; 3];
    for coord in &mut position {
        *coord = (rng.next_u32() % 1000) as f32 / 1000.0 * size;
    }
    let threshold = (rng.next_u32() % 4) as f32 * 0.5;
    MetavoxelLod::new(position, threshold)
}

struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn chance(&mut self, p: f64) -> bool {
        f64::from(self.next_u32()) / f64::from(u32::MAX) < p
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    ticks: u32,
    seed: u64,
    loss: f64,
    client_datagrams: u64,
    server_datagrams: u64,
    dropped: u64,
    server_bytes_total: u64,
    avg_server_bytes: u64,
    p95_server_bytes: u64,
    max_send_window: usize,
    max_receive_window: usize,
    settled_after: Option<u32>,
    #[serde(skip)]
    server_sizes: Vec<u64>,
}

impl Summary {
    fn new(cli: &Cli) -> Self {
        Self {
            ticks: cli.ticks,
            seed: cli.seed,
            loss: cli.loss,
            client_datagrams: 0,
            server_datagrams: 0,
            dropped: 0,
            server_bytes_total: 0,
            avg_server_bytes: 0,
            p95_server_bytes: 0,
            max_send_window: 0,
            max_receive_window: 0,
            settled_after: None,
            server_sizes: Vec::new(),
        }
    }

    fn observe(&mut self, client: &Client, server: &Server) {
        self.max_send_window = self.max_send_window.max(server.send_records().len());
        self.max_receive_window = self
            .max_receive_window
            .max(client.receive_records().len());
    }

    fn finalize(&mut self) {
        self.server_bytes_total = self.server_sizes.iter().sum();
        if !self.server_sizes.is_empty() {
            self.avg_server_bytes = self.server_bytes_total / self.server_sizes.len() as u64;
            self.server_sizes.sort_unstable();
            let idx = ((self.server_sizes.len() as f64) * 0.95).ceil() as usize;
            let idx = idx.saturating_sub(1).min(self.server_sizes.len() - 1);
            self.p95_server_bytes = self.server_sizes[idx];
        }
    }

    fn assert_budget(&self, max_p95: Option<u64>) -> Result<()> {
        if let Some(max_p95) = max_p95 {
            if self.p95_server_bytes > max_p95 {
                anyhow::bail!(
                    "p95 server datagram bytes {} exceeds budget {}",
                    self.p95_server_bytes,
                    max_p95
                );
            }
        }
        Ok(())
    }
}
