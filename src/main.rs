//! Volatile KV - serialization and volatility study
//!
//! Launches an in-process store, shows what each serializer writes, measures
//! single-operation and batched latency, and restarts the store to show what
//! survives under the configured policy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volatile_kv::study::SerializationStudy;
use volatile_kv::{
    BinaryFormatSerializer, CacheEngine, Cacheable, Config, StoreInstance, TextFormatSerializer,
    TypeRegistry,
};

/// Batched totals closer than this are treated as equal.
const BATCH_TOLERANCE: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, Deserialize)]
struct SampleObject {
    value: String,
}

impl Cacheable for SampleObject {}

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volatile_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Volatile KV study");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, save={}, snapshot={:?}, repetitions={}, batch_size={}",
        config.store_port,
        config.persist_on_shutdown,
        config.snapshot_path,
        config.bench_repetitions,
        config.bench_batch_size
    );

    let mut instance =
        StoreInstance::launch(config.store_config()).context("failed to launch store")?;
    info!("Store running on port {}", instance.port());

    let mut registry = TypeRegistry::with_primitives();
    registry.register::<SampleObject>();
    let registry = Arc::new(registry);
    let binary = BinaryFormatSerializer::new(Arc::clone(&registry));
    let text = TextFormatSerializer::new(registry);

    let mut engine = CacheEngine::new(instance.connect()?);
    let sample = SampleObject {
        value: "somevalue".to_string(),
    };

    // Format shape
    engine.put("sample:binary", &sample, &binary)?;
    engine.put("sample:text", &sample, &text)?;
    for key in ["sample:binary", "sample:text"] {
        let record = engine
            .inspect(key)?
            .with_context(|| format!("record for '{}' disappeared", key))?;
        info!(
            "{} format: {} bytes, type={}, raw={:?}",
            record.format,
            record.len(),
            record.type_name()?,
            record.to_text_lossy()
        );
    }

    // Latency
    let mut study = SerializationStudy::new(&mut engine, &binary, &text, "study");
    let single = study
        .single_op(&sample, config.bench_repetitions)
        .context("single-operation study failed")?;
    info!(
        "Single op over {} repetitions: binary mean={:?} text mean={:?} (binary faster in {})",
        single.repetitions(),
        single.binary_mean(),
        single.text_mean(),
        single.binary_wins()
    );

    let batch = study
        .batched(&sample, config.bench_batch_size)
        .context("batched study failed")?;
    if batch.within(BATCH_TOLERANCE) {
        info!(
            "Batched difference {:?} is within {:?}",
            batch.difference(),
            BATCH_TOLERANCE
        );
    } else {
        warn!(
            "Batched difference {:?} exceeds {:?}",
            batch.difference(),
            BATCH_TOLERANCE
        );
    }

    // Volatility
    engine.add_member("volatility", &"value".to_string(), &text)?;
    instance.restart().context("store restart failed")?;
    let survived: Vec<String> = engine.members("volatility", &text)?;
    info!(
        "After restart ({:?}, policy {:?}): {} member(s) survived, {} key(s) total",
        instance.state(),
        instance.policy(),
        survived.len(),
        engine.len()?
    );

    info!("Study complete: {:?}", engine.stats());
    Ok(())
}
