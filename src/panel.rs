use crate::error::RpcError;
use crate::models::{ProcessAction, ProcessCard};
use crate::supervisor::SupervisorClient;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Clone)]
pub struct ProcessPanel {
    client: SupervisorClient,
    cards: Arc<Mutex<Vec<ProcessCard>>>,
    cycle: Arc<Mutex<()>>,
}

impl ProcessPanel {
    pub fn new(client: SupervisorClient) -> Self {
        Self {
            client,
            cards: Arc::new(Mutex::new(Vec::new())),
            cycle: Arc::new(Mutex::new(())),
        }
    }

    pub async fn cards(&self) -> Vec<ProcessCard> {
        self.cards.lock().await.clone()
    }

    pub async fn render_html(&self) -> String {
        render_cards(&self.cards().await)
    }

    // On failure the previous cards stay in place.
    pub async fn refresh(&self) -> Result<Vec<ProcessCard>, RpcError> {
        let _cycle = self.cycle.lock().await;
        self.refresh_locked().await
    }

    pub async fn toggle(&self, name: &str, state: &str) -> Result<Vec<ProcessCard>, RpcError> {
        let _cycle = self.cycle.lock().await;
        let action = ProcessAction::for_state(state);
        if let Err(err) = self.client.control(action, name).await {
            warn!(process = name, action = action.as_str(), "control call failed: {err}");
            return Err(err);
        }
        self.refresh_locked().await
    }

    // Caller holds the cycle lock.
    async fn refresh_locked(&self) -> Result<Vec<ProcessCard>, RpcError> {
        let processes = match self.client.list_processes().await {
            Ok(processes) => processes,
            Err(err) => {
                warn!("process list failed: {err}");
                return Err(err);
            }
        };
        let cards: Vec<ProcessCard> = processes.iter().map(ProcessCard::from).collect();
        *self.cards.lock().await = cards.clone();
        Ok(cards)
    }
}

pub fn render_cards(cards: &[ProcessCard]) -> String {
    let mut html = String::new();
    for card in cards {
        let color = match card.action {
            ProcessAction::Stop => "bg-red-500 hover:bg-red-600",
            ProcessAction::Start => "bg-green-500 hover:bg-green-600",
        };
        html.push_str(&format!(
            r#"<div class="process-card p-4 bg-white rounded-lg shadow">
  <h2 class="text-xl font-semibold">{name}</h2>
  <p class="text-gray-700">状態: <span class="font-mono">{state}</span></p>
  <button type="button" data-action="{action}" data-process="{name_attr}" class="mt-4 px-4 py-2 text-white rounded {color}">{label}</button>
</div>
"#,
            name = html_escape::encode_text(&card.name),
            name_attr = html_escape::encode_double_quoted_attribute(&card.name),
            state = html_escape::encode_text(&card.state),
            action = card.action.as_str(),
            color = color,
            label = card.action.label(),
        ));
    }
    html
}
