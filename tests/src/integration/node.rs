//! The relay node as chain B: every step is a JSON command line, answered
//! the way the binary answers stdin.

use icp_01_light_client::test_utils::ChainSimulator;
use icp_02_token_relay::{ChannelEvent, ReceiptStatus};
use relay_node::config::WrappedToken;
use relay_node::{parse_command, Command, JsonLinesTransport, NodeConfig, NodeRuntime};
use serde_json::Value;

use super::harness::*;

fn send(node: &mut NodeRuntime, command: Command) -> Result<Value, String> {
    let line = serde_json::to_string(&command).unwrap();
    let response = node.handle(parse_command(&line).unwrap());
    if response.ok {
        Ok(response.result.unwrap_or(Value::Null))
    } else {
        Err(response.error.unwrap_or_default())
    }
}

fn run(node: &mut NodeRuntime, command: Command) -> Value {
    send(node, command).unwrap()
}

fn node_following(chain: &ChainSimulator) -> NodeRuntime {
    let mut config = NodeConfig::default();
    config.wrapped_tokens.push(WrappedToken {
        contract: token(),
        symbol: eos_symbol(),
    });
    let mut node = NodeRuntime::new(config).unwrap();
    run(
        &mut node,
        Command::InitSeed {
            caller: channel_account(),
            state: Box::new(chain.genesis().clone()),
        },
    );
    run(
        &mut node,
        Command::SetPeerContracts {
            caller: relay_account(),
            icp: channel_account(),
            peer: relay_account(),
        },
    );
    node
}

fn sync(node: &mut NodeRuntime, chain: &ChainSimulator, from: u32) {
    for num in from..=chain.head().block_num {
        let header = chain.header(num).unwrap().clone();
        run(node, Command::AddHeader { header });
    }
}

fn wrapped_balance(node: &mut NodeRuntime, account: &str) -> i64 {
    let balance = run(
        node,
        Command::Balance {
            contract: token(),
            account: name(account),
            symbol: eos_symbol(),
        },
    );
    balance["wrapped"].as_i64().unwrap()
}

#[tokio::test]
async fn test_node_receives_proven_packet() {
    let mut t = TwoChains::new();
    let mut node = node_following(&t.a.chain);

    let seq = t.send_from_a(100, "bob", 1_000);
    let proven = t.publish(Side::A);
    sync(&mut node, &t.a.chain, 2);

    let status = run(&mut node, Command::Status);
    assert_eq!(status["head"], t.a.chain.head().block_num);

    let result = run(
        &mut node,
        Command::DeliverPacket {
            proven: Box::new(proven[0].clone()),
            now: 10,
        },
    );
    assert_eq!(result["receipt"]["pseq"], seq);
    assert_eq!(result["receipt"]["status"], "Success");
    assert_eq!(wrapped_balance(&mut node, "bob"), 100);

    // Redelivery is a no-op.
    let again = run(
        &mut node,
        Command::DeliverPacket {
            proven: Box::new(proven[0].clone()),
            now: 10,
        },
    );
    assert!(again["receipt"].is_null());
    assert_eq!(wrapped_balance(&mut node, "bob"), 100);

    let transport = JsonLinesTransport::new(Vec::new());
    assert_eq!(node.flush(&transport).await.unwrap(), 1);
    let out = String::from_utf8(transport.into_inner()).unwrap();
    let line: Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
    let action = hex::decode(line["action"].as_str().unwrap()).unwrap();
    match ChannelEvent::decode(&action).unwrap() {
        ChannelEvent::Receipt(receipt) => {
            assert_eq!(receipt.pseq, seq);
            assert_eq!(receipt.status, ReceiptStatus::Success);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_node_rejects_unsynced_proof() {
    let mut t = TwoChains::new();
    let mut node = node_following(&t.a.chain);

    t.send_from_a(100, "bob", 1_000);
    let proven = t.publish(Side::A);

    let err = send(
        &mut node,
        Command::DeliverPacket {
            proven: Box::new(proven[0].clone()),
            now: 10,
        },
    )
    .unwrap_err();
    assert!(err.starts_with("relay:"), "{err}");
    assert_eq!(wrapped_balance(&mut node, "bob"), 0);
}

#[test]
fn test_node_catches_up_with_merkle_path() {
    let mut chain = ChainSimulator::new(&["alpha"]);
    let mut node = node_following(&chain);
    chain.produce_blocks(20);

    let result = run(
        &mut node,
        Command::AddHeaderWithMerklePath {
            state: Box::new(chain.state(21).unwrap().clone()),
            merkle_path: chain.id_path(1, 21),
        },
    );
    assert_eq!(result["id"], hex::encode(chain.state(21).unwrap().id));
    assert_eq!(result["status"]["head"], 21);

    let block = run(&mut node, Command::BlockByNum { block_num: 9 });
    assert_eq!(block["id"], hex::encode(chain.state(9).unwrap().id));
    assert!(block["action_mroot"].is_null());
}

#[test]
fn test_node_reset_requires_owner() {
    let chain = ChainSimulator::new(&["alpha"]);
    let mut node = node_following(&chain);

    let err = send(
        &mut node,
        Command::Reset {
            caller: name("mallory"),
            clear_all: true,
            max_blocks: 10,
        },
    )
    .unwrap_err();
    assert!(err.starts_with("light client:"), "{err}");

    run(
        &mut node,
        Command::Reset {
            caller: channel_account(),
            clear_all: true,
            max_blocks: 10,
        },
    );
    assert!(run(&mut node, Command::Status)["head"].is_null());
}
