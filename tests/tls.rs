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
    use rustls::{
        pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName},
        ClientConfig, RootCertStore, ServerConfig,
    };
    use tokio::net::{TcpListener, TcpStream};
    use tokio_rustls::{client::TlsStream, TlsConnector};

    use duolu::{
        http2::hpack::HeaderField, AlpnMonitor, Builder, Consts, Handshaker,
        NegotiationMonitor, Priority, ProtResult, RefuseHandler, StreamHandler, StreamIdentifier,
        StreamMessage, TlsHandshaker,
    };

    static CERT: &[u8] = include_bytes!("certs/localhost.crt.der");
    static KEY: &[u8] = include_bytes!("certs/localhost.key.der");

    struct Reverse;

    #[async_trait]
    impl StreamHandler for Reverse {
        async fn handle(
            &self,
            _stream_id: StreamIdentifier,
            message: StreamMessage,
        ) -> ProtResult<StreamMessage> {
            let mut body = message.body.to_vec();
            body.reverse();
            Ok(StreamMessage::new(
                vec![HeaderField::new(":status", "200")],
                Bytes::from(body),
            ))
        }
    }

    fn server_config() -> ServerConfig {
        ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(
                vec![CertificateDer::from(CERT.to_vec())],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(KEY.to_vec())),
            )
            .unwrap()
    }

    fn connector(protocols: &[&str]) -> TlsConnector {
        let mut roots = RootCertStore::empty();
        roots.add(CertificateDer::from(CERT.to_vec())).unwrap();
        let mut config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        config.alpn_protocols = protocols.iter().map(|p| p.as_bytes().to_vec()).collect();
        TlsConnector::from(Arc::new(config))
    }

    /// 在回环地址上完成一次握手, 返回双方的结果
    async fn handshake_pair(
        protocols: &[&str],
    ) -> (
        TlsStream<TcpStream>,
        tokio_rustls::server::TlsStream<TcpStream>,
        String,
        AlpnMonitor,
    ) {
        let _ = env_logger::builder().is_test(true).try_init();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handshaker = TlsHandshaker::new(server_config());
        let accept = tokio::spawn(async move {
            let (tcp, peer) = listener.accept().await.unwrap();
            let mut monitor = AlpnMonitor::new();
            monitor.attach(Some(peer));
            let (tls, protocol) = handshaker.handshake(tcp, &mut monitor).await.unwrap();
            (tls, protocol, monitor)
        });

        let tcp = TcpStream::connect(addr).await.unwrap();
        let client = connector(protocols)
            .connect(ServerName::try_from("localhost").unwrap(), tcp)
            .await
            .unwrap();
        let (server, protocol, monitor) = tokio::time::timeout(Duration::from_secs(5), accept)
            .await
            .unwrap()
            .unwrap();
        (client, server, protocol, monitor)
    }

    #[tokio::test]
    async fn tls_negotiates_multiplexed_protocol() {
        let (client, server, protocol, monitor) =
            handshake_pair(&[Consts::HTTP2_PROTOCOL]).await;
        assert_eq!(protocol, Consts::HTTP2_PROTOCOL);
        assert_eq!(monitor.offered(), [Consts::HTTP2_PROTOCOL.to_string()]);
        assert_eq!(monitor.selected(), Some(Consts::HTTP2_PROTOCOL));
        assert!(monitor.peer().is_some());
        assert_eq!(
            client.get_ref().1.alpn_protocol(),
            Some(Consts::HTTP2_PROTOCOL.as_bytes())
        );

        tokio::spawn(Builder::new().server_session(server).start(Arc::new(Reverse)));
        let session = Builder::new().client_session(client);
        let control = session.control();
        tokio::spawn(session.start(Arc::new(RefuseHandler)));

        let mut stream = control.open_stream(Priority::DEFAULT).unwrap();
        stream
            .send_message(StreamMessage::new(
                vec![
                    HeaderField::new(":method", "POST"),
                    HeaderField::new(":path", "/reverse"),
                ],
                Bytes::from_static(b"duolu"),
            ))
            .await
            .unwrap();
        let response = tokio::time::timeout(Duration::from_secs(5), stream.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&response.body[..], b"uloud");
    }

    #[tokio::test]
    async fn tls_without_alpn_falls_back_to_http1() {
        let (client, _server, protocol, monitor) = handshake_pair(&[]).await;
        assert_eq!(protocol, Consts::HTTP1_PROTOCOL);
        assert!(monitor.offered().is_empty());
        assert_eq!(monitor.selected(), Some(Consts::HTTP1_PROTOCOL));
        assert_eq!(client.get_ref().1.alpn_protocol(), None);
    }
}
