use clap::Parser;
use colored::*;
use futures::StreamExt;
use serde_json::{json, Value};

use cod_relay::api::decode::Utf8Carry;
use cod_relay::reflection::count_markers;

#[derive(Parser, Debug)]
#[command(name = "relay-probe")]
#[command(about = "Send one prompt through a running relay and print the raw response", long_about = None)]
struct ProbeArgs {
    #[arg(long = "url", default_value = "http://127.0.0.1:3000/", help = "Relay URL")]
    url: String,

    #[arg(long = "model", default_value = "openai/gpt-4o-mini", help = "Model to request")]
    model: String,

    #[arg(long = "stream", help = "Request a streamed response")]
    stream: bool,

    #[arg(help = "Prompt to send")]
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ProbeArgs::parse();
    if args.prompt.is_empty() {
        eprintln!("{}", "Error: a prompt is required".red());
        std::process::exit(1);
    }
    let prompt = args.prompt.join(" ");

    let request_body = json!({
        "model": args.model,
        "messages": [{"role": "user", "content": prompt}],
        "stream": args.stream
    });

    println!("{}", format!("Relay: {}", args.url).green());
    println!("{}", "Request payload:".bold());
    println!("{}", serde_json::to_string_pretty(&request_body)?);
    println!("{}", "-".repeat(80).dimmed());

    let response = reqwest::Client::new()
        .post(&args.url)
        .json(&request_body)
        .send()
        .await?;

    println!("{}", format!("HTTP {}", response.status()).bold());
    for (name, value) in response.headers() {
        println!("{}", format!("{}: {}", name, value.to_str().unwrap_or("<binary>")).dimmed());
    }
    println!("{}", "-".repeat(80).dimmed());

    if !response.status().is_success() {
        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => eprintln!("{}", serde_json::to_string_pretty(&body)?.red()),
            Err(_) => eprintln!("{}", text.red()),
        }
        std::process::exit(1);
    }

    let mut stream = response.bytes_stream();
    let mut decoder = Utf8Carry::new();
    let mut chunks = 0usize;
    let mut bytes = 0usize;
    let mut markers = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        bytes += chunk.len();
        let text = decoder.decode(&chunk);
        markers += count_markers(&text);
        println!("{}", format!("[chunk {} | {} bytes]", chunks, chunk.len()).cyan());
        print!("{}", text);
    }
    print!("{}", decoder.finish());

    println!();
    println!("{}", "-".repeat(80).dimmed());
    println!(
        "{}",
        format!(
            "Stream ended: {} chunks, {} bytes, {} reflection markers",
            chunks, bytes, markers
        )
        .green()
    );

    Ok(())
}
