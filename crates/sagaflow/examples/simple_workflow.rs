//! Simple two-step workflow example.

use async_trait::async_trait;
use sagaflow::prelude::*;

#[derive(Debug)]
struct LoadData {
    data: ContextToken<String>,
}

#[async_trait]
impl Step for LoadData {
    type Output = ();
    type Error = StepFault;

    async fn run(&self, ctx: &mut Context) -> Outcome<(), StepFault> {
        println!("Loading data...");
        ctx.set(&self.data, "sample data".to_string());
        Outcome::success(())
    }
}

#[derive(Debug)]
struct Shout {
    data: ContextToken<String>,
}

#[async_trait]
impl Step for Shout {
    type Output = usize;
    type Error = StepFault;

    async fn run(&self, ctx: &mut Context) -> Outcome<usize, StepFault> {
        match ctx.get_mut(&self.data) {
            Some(data) => {
                *data = data.to_uppercase();
                Outcome::success(data.len())
            }
            None => Outcome::error(StepFault::new("nothing loaded")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let data = ContextToken::new("data");
    let workflow = Workflow::builder("simple")
        .step(LoadData { data })
        .step(Shout { data })
        .build()?;

    match workflow.run().await? {
        Outcome::Success { data: report } => {
            println!("Workflow completed successfully");
            if let Some(value) = report.context.get(&data) {
                println!("Data: {}", value);
            }
        }
        Outcome::Error { error: failure } => {
            eprintln!("Workflow failed: {}", failure);
        }
    }

    Ok(())
}
