//! The prelude composes into a working agent.

use async_trait::async_trait;
use axon::prelude::*;
use std::sync::Arc;

struct CannedModel;

#[async_trait]
impl ChatModel for CannedModel {
    async fn stream(&self, _request: ChatRequest) -> Result<ChatStream, ModelError> {
        let mut chunk = ChatResponseChunk::text("r1", "hello from the prelude");
        chunk.stop_reason = Some(StopReason::EndTurn);
        Ok(Box::pin(futures::stream::iter(vec![Ok(chunk)])))
    }
}

#[tokio::test]
async fn prelude_builds_and_runs_an_agent() {
    let toolkit = Arc::new(Toolkit::new());
    toolkit.register(ToolEntry::schema_only(
        "lookup",
        "Look something up",
        vec![ParamSpec::string("query", "what to look up")],
    ));

    let agent = Arc::new(
        ReactAgent::builder(Arc::new(CannedModel))
            .name("prelude-agent")
            .toolkit(toolkit)
            .memory(Arc::new(InMemoryMemory::new()))
            .config(AgentConfig::default().with_max_iters(3))
            .build(),
    );

    let reply = agent.call(vec![Message::user("hi")]).await.unwrap();
    assert_eq!(reply.finish, FinishReason::Complete);
    assert_eq!(reply.message.text(), "hello from the prelude");

    let manager = SessionManager::new(Arc::new(MemorySessionBackend::new()));
    let components: Vec<Arc<dyn StateModule>> = vec![agent.clone()];
    manager
        .save(&SessionId::new("smoke"), &components)
        .await
        .unwrap();
    assert!(manager.exists(&SessionId::new("smoke")).await.unwrap());
}
