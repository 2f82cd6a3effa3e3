// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::{Consts, ProtError, ProtResult};

use super::{frame::Settings, ConnectionEnd, Session};

/// 连接的配置, 可以链式设置, 也可以从toml中读取, 时间均以秒为单位
///
/// ```toml
/// use_flow_control = true
/// use_priorities = true
/// max_frame_size = 16384
/// idle_timeout = 120
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Builder {
    /// 是否启用流量控制, 关闭时通过SETTINGS告知对端
    pub use_flow_control: bool,
    /// 是否按优先级调度, 关闭时流上的帧都在默认优先级中先进先出
    pub use_priorities: bool,
    /// 头部字符串是否使用哈夫曼编码
    pub use_huffman: bool,
    /// 本地接受的最大帧长
    pub max_frame_size: u32,
    /// 本地通告的流初始窗口
    pub initial_window_size: u32,
    /// 本地解压表的大小上限
    pub header_table_size: u32,
    pub max_concurrent_streams: u32,
    /// 连接在多久没有收到任何帧后关闭, 不设置则不超时
    #[serde(deserialize_with = "de_opt_secs")]
    pub idle_timeout: Option<Duration>,
    #[serde(deserialize_with = "de_secs")]
    pub handshake_timeout: Duration,
    /// Time to keep locally reset streams around before reaping.
    #[serde(deserialize_with = "de_secs")]
    pub reset_stream_duration: Duration,
    /// Maximum number of locally reset streams to keep at a time.
    pub reset_stream_max: usize,
}

fn de_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Duration::from_secs(u64::deserialize(deserializer)?))
}

fn de_opt_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            use_flow_control: true,
            use_priorities: true,
            use_huffman: true,
            max_frame_size: Consts::DEFAULT_MAX_FRAME_SIZE,
            initial_window_size: Consts::DEFAULT_INITIAL_WINDOW_SIZE,
            header_table_size: Consts::DEFAULT_HEADER_TABLE_SIZE as u32,
            max_concurrent_streams: Consts::DEFAULT_MAX_CONCURRENT_STREAMS,
            idle_timeout: None,
            handshake_timeout: Duration::from_secs(Consts::DEFAULT_HANDSHAKE_SECS),
            reset_stream_duration: Duration::from_secs(Consts::DEFAULT_RESET_STREAM_SECS),
            reset_stream_max: Consts::DEFAULT_RESET_STREAM_MAX,
        }
    }

    pub fn from_toml(content: &str) -> ProtResult<Builder> {
        let builder: Builder =
            toml::from_str(content).map_err(|e| ProtError::Config(e.to_string()))?;
        builder.validate()?;
        Ok(builder)
    }

    pub fn validate(&self) -> ProtResult<()> {
        if self.max_frame_size < Consts::DEFAULT_MAX_FRAME_SIZE
            || self.max_frame_size > Consts::MAX_FRAME_SIZE
        {
            return Err(ProtError::Config(format!(
                "max_frame_size {} out of range",
                self.max_frame_size
            )));
        }
        if self.initial_window_size > Consts::MAX_WINDOW_SIZE {
            return Err(ProtError::Config(format!(
                "initial_window_size {} out of range",
                self.initial_window_size
            )));
        }
        Ok(())
    }

    pub fn use_flow_control(&mut self, enabled: bool) -> &mut Self {
        self.use_flow_control = enabled;
        self
    }

    pub fn use_priorities(&mut self, enabled: bool) -> &mut Self {
        self.use_priorities = enabled;
        self
    }

    pub fn use_huffman(&mut self, enabled: bool) -> &mut Self {
        self.use_huffman = enabled;
        self
    }

    pub fn initial_window_size(&mut self, size: u32) -> &mut Self {
        assert!(size <= Consts::MAX_WINDOW_SIZE);
        self.initial_window_size = size;
        self
    }

    pub fn max_frame_size(&mut self, max: u32) -> &mut Self {
        assert!(max >= Consts::DEFAULT_MAX_FRAME_SIZE && max <= Consts::MAX_FRAME_SIZE);
        self.max_frame_size = max;
        self
    }

    pub fn header_table_size(&mut self, size: u32) -> &mut Self {
        self.header_table_size = size;
        self
    }

    pub fn max_concurrent_streams(&mut self, max: u32) -> &mut Self {
        self.max_concurrent_streams = max;
        self
    }

    pub fn idle_timeout(&mut self, dur: Option<Duration>) -> &mut Self {
        self.idle_timeout = dur;
        self
    }

    pub fn handshake_timeout(&mut self, dur: Duration) -> &mut Self {
        self.handshake_timeout = dur;
        self
    }

    pub fn max_concurrent_reset_streams(&mut self, max: usize) -> &mut Self {
        self.reset_stream_max = max;
        self
    }

    pub fn reset_stream_duration(&mut self, dur: Duration) -> &mut Self {
        self.reset_stream_duration = dur;
        self
    }

    /// 握手时发送给对端的SETTINGS
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.set_header_table_size(Some(self.header_table_size));
        settings.set_max_concurrent_streams(Some(self.max_concurrent_streams));
        settings.set_initial_window_size(Some(self.initial_window_size));
        settings.set_max_frame_size(Some(self.max_frame_size));
        if !self.use_flow_control {
            settings.set_flow_control_options(Some(1));
        }
        settings
    }

    pub fn server_session<T>(self, io: T) -> Session<T>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Session::new(io, ConnectionEnd::Server, self)
    }

    pub fn client_session<T>(self, io: T) -> Session<T>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Session::new(io, ConnectionEnd::Client, self)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}
