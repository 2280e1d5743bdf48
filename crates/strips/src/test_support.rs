//! In-memory media used by the strip tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stripcast_common::error::StripcastResult;
use stripcast_project_model::asset::Asset;
use tokio::sync::watch;

use crate::media::{Frame, MediaFactory, MediaHandle, MediaMetadata};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub paused: bool,
    pub volume: f32,
    pub position: f64,
    pub seeks: Vec<f64>,
    pub set_positions: Vec<f64>,
    pub plays: usize,
}

pub(crate) struct MockMedia {
    state: Arc<Mutex<MockState>>,
    _metadata_tx: watch::Sender<Option<MediaMetadata>>,
    metadata_rx: watch::Receiver<Option<MediaMetadata>>,
    hang_seeks: bool,
    frame: Option<Arc<Frame>>,
}

#[async_trait]
impl MediaHandle for MockMedia {
    fn metadata(&self) -> watch::Receiver<Option<MediaMetadata>> {
        self.metadata_rx.clone()
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn play(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.paused = false;
        state.plays += 1;
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn position_secs(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn set_position(&mut self, secs: f64) {
        let mut state = self.state.lock().unwrap();
        state.position = secs;
        state.set_positions.push(secs);
    }

    async fn seek(&mut self, secs: f64) -> StripcastResult<()> {
        if self.hang_seeks {
            return std::future::pending().await;
        }
        let mut state = self.state.lock().unwrap();
        state.position = secs;
        state.seeks.push(secs);
        Ok(())
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frame.clone()
    }
}

/// Hands out [`MockMedia`] and keeps each handle's state reachable by asset id.
pub(crate) struct MockFactory {
    pub metadata: Option<MediaMetadata>,
    pub hang_seeks: bool,
    states: Mutex<HashMap<String, Arc<Mutex<MockState>>>>,
}

impl MockFactory {
    pub fn loaded(width: u32, height: u32) -> Self {
        Self {
            metadata: Some(MediaMetadata {
                width,
                height,
                duration_secs: 10.0,
                has_audio: true,
            }),
            hang_seeks: false,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn unloaded() -> Self {
        Self {
            metadata: None,
            ..Self::loaded(0, 0)
        }
    }

    pub fn state(&self, asset_id: &str) -> Arc<Mutex<MockState>> {
        self.states.lock().unwrap()[asset_id].clone()
    }
}

impl MediaFactory for MockFactory {
    fn open(&self, asset: &Asset) -> Box<dyn MediaHandle> {
        let state = Arc::new(Mutex::new(MockState {
            paused: true,
            volume: 1.0,
            ..MockState::default()
        }));
        self.states
            .lock()
            .unwrap()
            .insert(asset.id.clone(), state.clone());
        let (metadata_tx, metadata_rx) = watch::channel(self.metadata);
        let frame = self
            .metadata
            .map(|m| Arc::new(Frame::solid(m.width.max(1), m.height.max(1), [255, 0, 0, 255])));
        Box::new(MockMedia {
            state,
            _metadata_tx: metadata_tx,
            metadata_rx,
            hang_seeks: self.hang_seeks,
            frame,
        })
    }
}
