//! Scripted session on an in-process mesh.

use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use walkie_common::{PeerId, WalkieError};
use walkie_config::WalkieConfig;
use walkie_mesh::media::memory::MemoryMedia;
use walkie_mesh::transport::memory::MemoryHub;
use walkie_mesh::{spawn_log_sink, Cue, CuePlayer, MeshConfig, MeshManager, Participant};

/// Map the file config onto the manager's runtime config.
pub fn mesh_config(config: &WalkieConfig) -> MeshConfig {
    MeshConfig {
        display_name: config.identity.display_name.clone(),
        channel_name: config.channel.name.clone(),
        registration_timeout: Duration::from_millis(u64::from(config.session.registration_timeout_ms)),
        placeholder_name: config.session.placeholder_name.clone(),
        max_name_len: config.session.max_name_len as usize,
        cues_enabled: config.cues.enabled,
        static_cue_delay: Duration::from_millis(u64::from(config.cues.static_delay_ms)),
        ..MeshConfig::default()
    }
}

/// Cue player that narrates cues through tracing.
struct TracingCues {
    label: String,
    volume: f64,
    static_volume: f64,
}

impl CuePlayer for TracingCues {
    fn play(&self, cue: Cue) {
        let volume = match cue {
            Cue::Static => self.static_volume,
            Cue::StartTone | Cue::EndTone => self.volume,
        };
        info!(peer = %self.label, ?cue, volume, "cue on");
    }

    fn stop(&self, cue: Cue) {
        info!(peer = %self.label, ?cue, "cue off");
    }
}

/// What each participant saw at the end of the round.
#[derive(Debug, Default)]
pub struct Summary {
    pub views: Vec<(String, Vec<Participant>)>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, participants) in &self.views {
            let mut line = String::new();
            for p in participants {
                let _ = write!(line, " {} ({})", p.display_name, p.peer_id);
            }
            writeln!(f, "{name} sees:{line}")?;
        }
        Ok(())
    }
}

/// Drain every inbox until no manager has work left.
async fn settle(nodes: &mut [MeshManager]) {
    loop {
        let mut handled = 0;
        for node in nodes.iter_mut() {
            handled += node.process_pending().await;
        }
        if handled == 0 {
            break;
        }
    }
}

pub async fn run(config: &WalkieConfig, peers: usize) -> Result<Summary, WalkieError> {
    let hub = MemoryHub::new();
    let base = mesh_config(config);

    let mut nodes = Vec::with_capacity(peers);
    let mut sinks = Vec::with_capacity(peers);
    for n in 0..peers {
        let mut node_config = base.clone();
        if n > 0 {
            node_config.display_name = format!("{} {}", base.placeholder_name, n + 1);
        }
        let cues = Arc::new(TracingCues {
            label: node_config.display_name.clone(),
            volume: config.cues.volume,
            static_volume: config.cues.static_volume,
        });
        let label = node_config.display_name.clone();
        let node = MeshManager::new(
            node_config,
            Arc::new(hub.endpoint()),
            Arc::new(MemoryMedia::new()),
            cues,
        );
        sinks.push(spawn_log_sink(label, node.subscribe()));
        nodes.push(node);
    }

    let mut ids: Vec<PeerId> = Vec::with_capacity(peers);
    for node in nodes.iter_mut() {
        ids.push(node.connect().await?);
    }
    info!(peers = ids.len(), channel = %base.channel_name, "All participants registered");

    for (i, node) in nodes.iter_mut().enumerate() {
        for target in &ids[i + 1..] {
            node.dial_peer(target)?;
        }
    }
    settle(&mut nodes).await;

    // One push-to-talk round from the first participant.
    nodes[0].start_talking()?;
    settle(&mut nodes).await;
    tokio::time::sleep(base.static_cue_delay + Duration::from_millis(100)).await;
    nodes[0].stop_talking();
    settle(&mut nodes).await;

    let renamed = format!("{} (away)", nodes[1].local().display_name);
    nodes[1].set_display_name(&renamed)?;
    settle(&mut nodes).await;

    let summary = Summary {
        views: nodes
            .iter()
            .map(|n| (n.local().display_name.clone(), n.participants()))
            .collect(),
    };

    for node in nodes.iter_mut() {
        node.disconnect();
    }
    settle(&mut nodes).await;
    drop(nodes);
    for sink in sinks {
        let _ = sink.await;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_config_follows_file_config() {
        let mut config = WalkieConfig::default();
        config.identity.display_name = "Lucía".into();
        config.session.registration_timeout_ms = 5_000;
        config.cues.static_delay_ms = 120;
        config.cues.enabled = false;

        let mesh = mesh_config(&config);
        assert_eq!(mesh.display_name, "Lucía");
        assert_eq!(mesh.channel_name, "corazones-abiertos");
        assert_eq!(mesh.registration_timeout, Duration::from_secs(5));
        assert_eq!(mesh.static_cue_delay, Duration::from_millis(120));
        assert_eq!(mesh.max_name_len, 32);
        assert!(!mesh.cues_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn demo_round_builds_full_mesh() {
        let summary = run(&WalkieConfig::default(), 3).await.unwrap();
        assert_eq!(summary.views.len(), 3);
        for (_, participants) in &summary.views {
            assert_eq!(participants.len(), 2);
            assert!(participants.iter().all(|p| !p.is_talking));
        }
        assert_eq!(summary.views[1].0, "Usuario 2 (away)");
        assert!(summary.views[0]
            .1
            .iter()
            .any(|p| p.display_name == "Usuario 2 (away)"));
        assert!(summary.to_string().contains("Anónimo sees:"));
    }
}
