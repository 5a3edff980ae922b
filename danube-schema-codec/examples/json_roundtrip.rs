use anyhow::Result;
use danube_schema_codec::{
    JsonDeserializer, JsonSerializer, MemoryRegistry, SerializationContext, SerializerConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Serialize, Debug)]
struct MyMessage {
    field1: String,
    field2: i32,
}

const SCHEMA: &str = r#"{
    "title": "MyMessage",
    "type": "object",
    "properties": {
        "field1": {"type": "string"},
        "field2": {"type": "integer"}
    },
    "required": ["field1", "field2"]
}"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let registry = Arc::new(MemoryRegistry::new());

    let serializer: JsonSerializer<MyMessage> = JsonSerializer::builder(SCHEMA, registry.clone())
        .with_config(SerializerConfig::default())
        .build()?;
    let deserializer: JsonDeserializer<MyMessage> = JsonDeserializer::builder(SCHEMA).build()?;

    let ctx = SerializationContext::value("my-app-events");

    for i in 0..3 {
        let message = MyMessage {
            field1: format!("event-{}", i),
            field2: i,
        };

        let Some(bytes) = serializer.serialize(Some(&message), &ctx).await? else {
            continue;
        };
        println!("Framed {} bytes: {:02x?}", bytes.len(), &bytes[..5]);

        let decoded = deserializer.deserialize(Some(bytes.as_slice()), Some(&ctx))?;
        println!("Decoded: {:?}", decoded);
    }

    println!(
        "Subject {} resolved with {} registry call(s)",
        serializer.subject_name(&ctx),
        registry.total_calls()
    );

    Ok(())
}
