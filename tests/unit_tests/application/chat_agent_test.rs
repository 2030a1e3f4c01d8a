use std::sync::Arc;

use policy_chat::application::ports::{
    Completion, LlmClientError, ThreadMemory, TurnRole,
};
use policy_chat::application::services::{AgentError, ChatAgent, SEARCH_POLICIES_TOOL};
use policy_chat::domain::ThreadId;
use policy_chat::infrastructure::persistence::{InMemoryPolicyStore, InMemoryThreadMemory};

use crate::support::{ScriptedLlmClient, policy_search, sample_chunks, tool_call};

const SYSTEM_PROMPT: &str = "You answer policy questions.";
const MAX_TOOL_ITERATIONS: usize = 2;

async fn agent_with(
    llm: Arc<ScriptedLlmClient>,
    memory: Arc<InMemoryThreadMemory>,
    seeded: bool,
) -> ChatAgent<ScriptedLlmClient, InMemoryPolicyStore> {
    let chunks = if seeded { sample_chunks() } else { Vec::new() };
    ChatAgent::new(
        llm,
        policy_search(&chunks).await,
        memory,
        SYSTEM_PROMPT.to_string(),
        MAX_TOOL_ITERATIONS,
    )
}

#[tokio::test]
async fn given_indexed_policies_when_chatting_then_question_is_enriched_with_context() {
    let llm = Arc::new(ScriptedLlmClient::replying("Lot B after 5pm."));
    let agent = agent_with(llm.clone(), Arc::new(InMemoryThreadMemory::new()), true).await;

    let reply = agent
        .chat("Where can I park?", &ThreadId::default())
        .await
        .unwrap();

    assert_eq!(reply.content, "Lot B after 5pm.");
    assert!(reply.context_used);
    assert!(reply.tool_calls.is_empty());

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let turns = &requests[0];
    assert_eq!(turns[0].role, TurnRole::System);
    assert_eq!(turns[0].content, SYSTEM_PROMPT);

    let user_turn = turns.last().unwrap();
    assert_eq!(user_turn.role, TurnRole::User);
    assert!(user_turn.content.starts_with("Context:\n"));
    assert!(user_turn.content.contains("lot B after 5pm"));
    assert!(user_turn
        .content
        .ends_with("\n\nUser Question:\nWhere can I park?"));
}

#[tokio::test]
async fn given_empty_knowledge_base_when_chatting_then_question_is_sent_verbatim() {
    let llm = Arc::new(ScriptedLlmClient::replying("I don't know."));
    let agent = agent_with(llm.clone(), Arc::new(InMemoryThreadMemory::new()), false).await;

    let reply = agent
        .chat("Where can I park?", &ThreadId::default())
        .await
        .unwrap();

    assert!(!reply.context_used);
    let turns = &llm.requests()[0];
    assert_eq!(turns.last().unwrap().content, "Where can I park?");
}

#[tokio::test]
async fn given_previous_turns_when_chatting_on_same_thread_then_history_is_replayed() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![
        Ok(Completion::Text("First answer".to_string())),
        Ok(Completion::Text("Second answer".to_string())),
    ]));
    let agent = agent_with(llm.clone(), Arc::new(InMemoryThreadMemory::new()), false).await;
    let thread = ThreadId::parse("session_1").unwrap();

    agent.chat("First question", &thread).await.unwrap();
    agent.chat("Second question", &thread).await.unwrap();

    let second = &llm.requests()[1];
    let contents: Vec<&str> = second.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            SYSTEM_PROMPT,
            "First question",
            "First answer",
            "Second question"
        ]
    );
}

#[tokio::test]
async fn given_different_threads_when_chatting_then_histories_are_isolated() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![
        Ok(Completion::Text("one".to_string())),
        Ok(Completion::Text("two".to_string())),
    ]));
    let agent = agent_with(llm.clone(), Arc::new(InMemoryThreadMemory::new()), false).await;

    agent
        .chat("Question A", &ThreadId::parse("a").unwrap())
        .await
        .unwrap();
    agent
        .chat("Question B", &ThreadId::parse("b").unwrap())
        .await
        .unwrap();

    assert_eq!(llm.requests()[1].len(), 2);
}

#[tokio::test]
async fn given_model_requests_policy_search_when_chatting_then_tool_output_is_fed_back() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![
        Ok(Completion::ToolCalls(vec![tool_call(
            "call_1",
            SEARCH_POLICIES_TOOL,
            r#"{"query": "transfer credit"}"#,
        )])),
        Ok(Completion::Text("Grades of C or higher transfer.".to_string())),
    ]));
    let memory = Arc::new(InMemoryThreadMemory::new());
    let agent = agent_with(llm.clone(), memory.clone(), true).await;
    let thread = ThreadId::default();

    let reply = agent.chat("Do my credits transfer?", &thread).await.unwrap();

    assert_eq!(reply.content, "Grades of C or higher transfer.");
    assert_eq!(reply.tool_calls, vec![SEARCH_POLICIES_TOOL.to_string()]);

    let second = &llm.requests()[1];
    let tool_turn = second.last().unwrap();
    assert_eq!(tool_turn.role, TurnRole::Tool);
    assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_turn.content.starts_with("**Result 1**\n"));

    let stored: Vec<TurnRole> = memory
        .load(&thread)
        .await
        .unwrap()
        .iter()
        .map(|t| t.role)
        .collect();
    assert_eq!(
        stored,
        vec![
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::Tool,
            TurnRole::Assistant
        ]
    );
}

#[tokio::test]
async fn given_unknown_tool_when_model_calls_it_then_tool_result_reports_it() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![
        Ok(Completion::ToolCalls(vec![tool_call("call_1", "fetch_weather", "{}")])),
        Ok(Completion::Text("Sorry.".to_string())),
    ]));
    let agent = agent_with(llm.clone(), Arc::new(InMemoryThreadMemory::new()), false).await;

    agent.chat("Weather?", &ThreadId::default()).await.unwrap();

    let tool_turn = llm.requests()[1].last().unwrap().clone();
    assert_eq!(tool_turn.content, "Unknown tool: fetch_weather");
}

#[tokio::test]
async fn given_model_never_stops_calling_tools_when_chatting_then_limit_error_is_returned() {
    let looping = || {
        Ok(Completion::ToolCalls(vec![tool_call(
            "call",
            SEARCH_POLICIES_TOOL,
            r#"{"query": "parking"}"#,
        )]))
    };
    let llm = Arc::new(ScriptedLlmClient::new(vec![looping(), looping(), looping()]));
    let memory = Arc::new(InMemoryThreadMemory::new());
    let agent = agent_with(llm.clone(), memory.clone(), true).await;
    let thread = ThreadId::default();

    let result = agent.chat("Parking?", &thread).await;

    assert!(matches!(
        result,
        Err(AgentError::ToolLimitExceeded(MAX_TOOL_ITERATIONS))
    ));
    assert_eq!(llm.requests().len(), MAX_TOOL_ITERATIONS + 1);
    assert!(memory.load(&thread).await.unwrap().is_empty());
}

#[tokio::test]
async fn given_llm_failure_when_chatting_then_error_propagates_and_memory_is_untouched() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![Err(LlmClientError::RateLimited)]));
    let memory = Arc::new(InMemoryThreadMemory::new());
    let agent = agent_with(llm, memory.clone(), false).await;
    let thread = ThreadId::default();

    let result = agent.chat("Hello", &thread).await;

    assert!(matches!(result, Err(AgentError::Completion(_))));
    assert!(memory.load(&thread).await.unwrap().is_empty());
}

#[tokio::test]
async fn given_thread_with_history_when_deleting_then_memory_is_cleared() {
    let llm = Arc::new(ScriptedLlmClient::replying("Hi"));
    let memory = Arc::new(InMemoryThreadMemory::new());
    let agent = agent_with(llm, memory.clone(), false).await;
    let thread = ThreadId::parse("to-delete").unwrap();
    agent.chat("Hello", &thread).await.unwrap();

    agent.delete_thread(&thread).await.unwrap();

    assert!(memory.load(&thread).await.unwrap().is_empty());
}
