use std::fmt;
use std::str::FromStr;

use raylib::prelude::*;

use crate::error::StudioResult;
use crate::render::Renderer;

/// The three outputs other tools can pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Debug,
    Projection,
    Desktop,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Debug, Channel::Projection, Channel::Desktop];

    /// Name shown to whatever receives the channel.
    pub fn title(self) -> &'static str {
        match self {
            Channel::Debug => "Debug Screen",
            Channel::Projection => "Projection Screen",
            Channel::Desktop => "Desktop Screen",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Debug => "debug",
            Channel::Projection => "projection",
            Channel::Desktop => "desktop",
        })
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.to_string() == wanted)
            .ok_or_else(|| format!("unknown channel '{s}' (expected debug, projection or desktop)"))
    }
}

/// `--record projection=wall.mp4`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    pub channel: Channel,
    pub target: String,
}

impl FromStr for RecordTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, target) = s
            .split_once('=')
            .ok_or_else(|| format!("expected CHANNEL=TARGET, got '{s}'"))?;
        if target.is_empty() {
            return Err(format!("missing target for channel '{channel}'"));
        }
        Ok(Self {
            channel: channel.parse()?,
            target: target.to_string(),
        })
    }
}

/// Receives one channel's finished texture every tick.
pub trait TexturePublisher {
    fn channel(&self) -> Channel;
    fn describe(&self) -> String;
    fn publish(&mut self, texture: &RenderTexture2D) -> StudioResult<()>;
}

#[derive(Default)]
pub struct Publishers {
    sinks: Vec<Box<dyn TexturePublisher>>,
}

impl Publishers {
    pub fn add(&mut self, sink: Box<dyn TexturePublisher>) {
        tracing::info!(channel = %sink.channel(), sink = %sink.describe(), "publishing");
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Hands every channel to its sinks. A sink that fails is dropped so
    /// the installation keeps running.
    pub fn publish_all(&mut self, renderer: &Renderer) {
        self.sinks.retain_mut(|sink| {
            let channel = sink.channel();
            match sink.publish(renderer.texture(channel)) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(%channel, sink = %sink.describe(), error = %e, "publisher disabled");
                    false
                }
            }
        });
    }
}
