use agentflow::{ChannelEvent, ChannelOptions, EngineBuilder, FlowDraft, FlowModel};

#[tokio::main]
async fn main() -> agentflow::Result<()> {
    let engine = EngineBuilder::new().build()?;

    engine.launch()?;

    let text = include_str!("./flow.json");

    let model = FlowModel::from_json(text)?;
    let flow = engine.create_flow(FlowDraft {
        name: model.name,
        description: model.description,
        creator: "demo".to_string(),
        nodes: model.nodes,
        edges: model.edges,
    })?;
    engine.publish_flow(&flow.id)?;

    ChannelEvent::channel(engine.channel(), ChannelOptions::default())?.on_complete(move |eid| {
        println!("Execution completed, eid: {}", eid);
    });

    ChannelEvent::channel(engine.channel(), ChannelOptions::default())?.on_error(move |e| {
        println!("Execution failed: {:?}", e);
    });

    let response = engine.execute_flow(&flow.id, "12 * 7.5").await?;
    println!("Response ({}):\n{}", response.format, response.content);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    engine.shutdown();
    Ok(())
}
