//! Basic OpenAI client usage example

use openai_client::{ChatRequest, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::from_env()?;

    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::system("You write short product copy."))
                .message(Message::user(
                    "Reply with {\"description\": \"...\"} for a 12m garden hose reel.",
                ))
                .temperature(0.4)
                .json_object(),
        )
        .await?;

    println!("Response: {:?}", response.content);
    if let Some(usage) = response.usage {
        println!(
            "Tokens: {} in / {} out",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(())
}
