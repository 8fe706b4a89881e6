//! End-to-end test of the holder/follower replication exchange.

use mirrorchain::codec;
use mirrorchain::error::LedgerError;
use mirrorchain::ledger::{HashChain, Transaction};
use mirrorchain::replication::{ReplicationClient, ReplicationServer};
use std::time::Duration;
use tokio::net::TcpListener;

fn build_chain() -> HashChain {
    let mut chain = HashChain::with_genesis(vec![
        Transaction::from_f64("Don", "Pam", 50.0).unwrap(),
        Transaction::from_f64("Nikki", "Sauce", 25.0).unwrap(),
    ]);
    chain
        .append_block(vec![Transaction::from_f64("Sauce", "Don", 15.0).unwrap()])
        .unwrap();
    chain
}

#[tokio::test]
async fn holder_to_follower_exchange() {
    tokio::time::timeout(Duration::from_secs(5), async {
        let chain = build_chain();
        assert!(chain.verify());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = ReplicationServer::new(chain.clone());
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let follower = ReplicationClient::new();
        let received = follower.replicate_from("127.0.0.1", port).await.unwrap();

        assert_eq!(received.len(), 2);
        assert_eq!(received.blocks[0].index, 0);
        assert_eq!(received.blocks[1].index, 1);
        assert_eq!(received.blocks[1].prev_hash, received.blocks[0].hash);
        for (sent, got) in chain.blocks.iter().zip(&received.blocks) {
            assert_eq!(got.index, sent.index);
            assert_eq!(got.timestamp, sent.timestamp);
            assert_eq!(got.prev_hash, sent.prev_hash);
            assert_eq!(got.hash, sent.hash);
        }
        assert!(received.check_linkage().is_ok());
    })
    .await
    .expect("holder_to_follower_exchange timed out");
}

#[tokio::test]
async fn concurrent_followers_receive_identical_chains() {
    tokio::time::timeout(Duration::from_secs(5), async {
        let chain = build_chain();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = ReplicationServer::new(chain.clone()).include_transactions(true);
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let mut handles = Vec::new();
        for _ in 0..4 {
            handles.push(tokio::spawn(async move {
                ReplicationClient::new()
                    .replicate_from("127.0.0.1", port)
                    .await
            }));
        }
        for handle in handles {
            let received = handle.await.unwrap().unwrap();
            assert_eq!(received, chain);
            assert!(received.verify());
        }
    })
    .await
    .expect("concurrent_followers timed out");
}

#[tokio::test]
async fn follower_gives_up_after_bounded_attempts() {
    tokio::time::timeout(Duration::from_secs(5), async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let follower = ReplicationClient::new()
            .with_max_attempts(3)
            .with_retry_delay(Duration::from_millis(10));
        let err = follower.replicate_from("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ConnectionFailed { attempts: 3, .. }
        ));
    })
    .await
    .expect("follower_gives_up timed out");
}

#[test]
fn wire_payload_matches_documented_schema() {
    let chain = build_chain();
    let frame = codec::encode_chain(&chain, false).unwrap();

    let declared = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
    assert_eq!(declared, frame.len() - 4);

    let records: serde_json::Value = serde_json::from_slice(&frame[4..]).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record["index"], i as u64);
        assert!(record["timestamp"].is_i64());
        assert_eq!(record["prev_hash"].as_str().unwrap().len(), 64);
        assert_eq!(record["hash"].as_str().unwrap().len(), 64);
        assert!(record.get("transactions").is_none());
    }
    assert_eq!(
        records[0]["prev_hash"].as_str().unwrap(),
        "0".repeat(64)
    );
}
