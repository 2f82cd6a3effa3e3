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
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::net::TcpStream;

    use duolu::{
        http2::hpack::HeaderField, Builder, PlainHandshaker, Priority, ProtResult,
        RefuseHandler, Server, StreamHandler, StreamIdentifier, StreamMessage,
    };

    struct Upper;

    #[async_trait]
    impl StreamHandler for Upper {
        async fn handle(
            &self,
            _stream_id: StreamIdentifier,
            message: StreamMessage,
        ) -> ProtResult<StreamMessage> {
            let body = Bytes::from(message.body.to_ascii_uppercase());
            Ok(StreamMessage::new(
                vec![HeaderField::new(":status", "200")],
                body,
            ))
        }
    }

    #[tokio::test]
    async fn tcp_server_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = Server::bind("127.0.0.1:0", PlainHandshaker, Upper, Builder::new())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let stream = TcpStream::connect(addr).await.unwrap();
        let session = Builder::new().client_session(stream);
        let control = session.control();
        tokio::spawn(session.start(Arc::new(RefuseHandler)));

        for text in ["hello", "duolu", ""] {
            let mut stream = control.open_stream(Priority::DEFAULT).unwrap();
            stream
                .send_message(StreamMessage::new(
                    vec![
                        HeaderField::new(":method", "POST"),
                        HeaderField::new(":path", "/upper"),
                    ],
                    Bytes::from(text),
                ))
                .await
                .unwrap();
            let response = tokio::time::timeout(Duration::from_secs(5), stream.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(response.body, Bytes::from(text.to_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn bind_rejects_invalid_config() {
        let mut builder = Builder::new();
        builder.max_frame_size = 10;
        assert!(
            Server::bind("127.0.0.1:0", PlainHandshaker, Upper, builder)
                .await
                .is_err()
        );
    }
}
