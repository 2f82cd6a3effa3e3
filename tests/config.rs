// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

#![deny(rust_2018_idioms)]

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use duolu::{Builder, Consts, ProtError};

    #[test]
    fn empty_toml_uses_defaults() {
        let builder = Builder::from_toml("").unwrap();
        assert!(builder.use_flow_control);
        assert!(builder.use_priorities);
        assert!(builder.use_huffman);
        assert_eq!(builder.max_frame_size, Consts::DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(builder.initial_window_size, Consts::DEFAULT_INITIAL_WINDOW_SIZE);
        assert_eq!(builder.idle_timeout, None);
        assert_eq!(
            builder.handshake_timeout,
            Duration::from_secs(Consts::DEFAULT_HANDSHAKE_SECS)
        );
    }

    #[test]
    fn toml_overrides() {
        let builder = Builder::from_toml(
            r#"
            use_priorities = false
            max_frame_size = 32768
            idle_timeout = 120
            handshake_timeout = 3
            reset_stream_max = 0
            "#,
        )
        .unwrap();
        assert!(!builder.use_priorities);
        assert_eq!(builder.max_frame_size, 32768);
        assert_eq!(builder.idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(builder.handshake_timeout, Duration::from_secs(3));
        assert_eq!(builder.reset_stream_max, 0);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            Builder::from_toml("max_frame_size = 100"),
            Err(ProtError::Config(_))
        ));
        assert!(matches!(
            Builder::from_toml("use_huffman = \"yes\""),
            Err(ProtError::Config(_))
        ));
        let mut builder = Builder::new();
        builder.initial_window_size = Consts::MAX_WINDOW_SIZE + 1;
        assert!(builder.validate().is_err());
    }

    #[test]
    fn settings_reflect_builder() {
        let mut builder = Builder::new();
        builder.initial_window_size(1024).max_concurrent_streams(8);
        let settings = builder.settings();
        assert_eq!(settings.initial_window_size(), Some(1024));
        assert_eq!(settings.max_concurrent_streams(), Some(8));
        assert_eq!(settings.flow_control_options(), None);
        assert!(!settings.is_flow_control_disabled());

        builder.use_flow_control(false);
        let settings = builder.settings();
        assert_eq!(settings.flow_control_options(), Some(1));
        assert!(settings.is_flow_control_disabled());
    }
}
