mod common;

use common::{
    call_data, client, config, config_v07, receipt, rpc_error, word, FakeNode, GET_NONCE,
    MAX_FEE_PER_GAS, MAX_PRIORITY_FEE_PER_GAS, PAYMASTER,
};
use ethers::{
    types::{Address, Bytes, U256},
    utils::hex,
};
use lightkit_account::is_6492_signature;
use lightkit_client::{ClientError, PaymasterMode, SubmissionState, WaitConfig};
use lightkit_primitives::{
    AccountVersion, CallData, EntryPointVersion, UserOperationCallData, UserOperationOverrides,
    UserOperationRequest,
};
use serde_json::{json, Value};

fn call() -> eyre::Result<UserOperationCallData> {
    Ok(UserOperationCallData::Single(CallData::new(
        "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef".parse()?,
        "0xcafe".parse()?,
    )))
}

fn sponsored_paymaster_and_data() -> Bytes {
    format!("{PAYMASTER}{}", "ab".repeat(65)).parse().unwrap_or_default()
}

#[tokio::test]
async fn send_user_operation() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;

    let submission = client.send_user_operation(&call()?, &Default::default()).await?;
    assert_eq!(submission.state, SubmissionState::Submitted);
    assert_eq!(submission.hash, client.user_operation_hash(&submission.request));

    let sent = node.sent();
    assert_eq!(sent.len(), 1);
    let uo = &sent[0];
    assert_eq!(uo.sender, client.address());
    assert_eq!(uo.init_code, client.account().factory_init_code());
    assert_eq!(uo.call_gas_limit, U256::from(0x7530));
    assert_eq!(uo.verification_gas_limit, U256::from(0x186a0));
    assert_eq!(uo.pre_verification_gas, U256::from(0xc350));
    assert_eq!(uo.max_fee_per_gas, U256::from(MAX_FEE_PER_GAS));
    assert_eq!(uo.max_priority_fee_per_gas, U256::from(MAX_PRIORITY_FEE_PER_GAS));
    assert_eq!(uo.signature.len(), 65);
    assert_eq!(uo, &submission.request);

    // gas is estimated with the dummy signature
    let estimated = &node.calls("eth_estimateUserOperationGas")[0][0];
    assert_eq!(estimated["signature"], json!(client.account().dummy_signature()));
    Ok(())
}

#[tokio::test]
async fn nonce_key() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("eth_call", |params, _| {
        let data = call_data(params);
        assert!(data.starts_with(GET_NONCE));
        // key argument
        assert_eq!(&data[74..], format!("{:064x}", 0x12));
        Ok(word((U256::from(0x12) << 64) + 3))
    });
    let client = client(&node, config()?).await?;

    let overrides = UserOperationOverrides::default().nonce_key(0x12.into());
    let submission = client.send_user_operation(&call()?, &overrides).await?;

    assert_eq!(submission.nonce(), (U256::from(0x12) << 64) + 3);
    assert!(format!("{:#x}", submission.nonce()).starts_with("0x12"));
    assert_eq!(node.sent()[0].nonce, submission.nonce());
    Ok(())
}

#[tokio::test]
async fn nonce_key_too_wide() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;

    let overrides = UserOperationOverrides::default().nonce_key(U256::one() << 192);
    let err = client.build_user_operation(&call()?, &overrides).await.unwrap_err();
    assert!(matches!(err, ClientError::MiddlewareStage { ref stage, .. } if stage == "nonce"));
    assert!(node.calls("eth_call").is_empty());
    Ok(())
}

#[tokio::test]
async fn pipeline_stages() -> eyre::Result<()> {
    let node = FakeNode::new();

    let unsponsored = client(&node, config()?).await?;
    assert_eq!(
        unsponsored.pipeline(&Default::default()).stage_names(),
        vec!["nonce", "gas-estimator", "fee-estimator"]
    );

    let erc7677 = client(
        &node,
        lightkit_client::ClientConfig {
            paymaster: PaymasterMode::Erc7677 { context: None },
            ..config()?
        },
    )
    .await?;
    assert_eq!(
        erc7677.pipeline(&Default::default()).stage_names(),
        vec!["nonce", "erc7677-stub", "gas-estimator", "fee-estimator", "erc7677-data"]
    );
    let bypass = UserOperationOverrides::default().paymaster_and_data(Bytes::default());
    assert_eq!(
        erc7677.pipeline(&bypass).stage_names(),
        vec!["nonce", "gas-estimator", "fee-estimator"]
    );

    let vendor = client(
        &node,
        lightkit_client::ClientConfig {
            paymaster: PaymasterMode::Vendor { policy_id: "policy".into() },
            ..config()?
        },
    )
    .await?;
    assert_eq!(
        vendor.pipeline(&Default::default()).stage_names(),
        vec!["nonce", "fee-estimator", "vendor-paymaster"]
    );
    Ok(())
}

#[tokio::test]
async fn erc7677_sponsorship() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("pm_getPaymasterStubData", |params, _| {
        assert_eq!(params[2], json!("0x1"));
        assert_eq!(params[3], json!({ "sponsor": "lightkit" }));
        Ok(json!({ "paymasterAndData": format!("{PAYMASTER}00") }))
    });
    let final_data = sponsored_paymaster_and_data();
    let sponsored = final_data.clone();
    node.on("pm_getPaymasterData", move |params, _| {
        // the final sponsorship sees the estimated gas and fees
        assert_eq!(params[0]["maxFeePerGas"], json!("0xa0"));
        assert_eq!(params[0]["callGasLimit"], json!("0x7530"));
        Ok(json!({ "paymasterAndData": sponsored }))
    });

    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Erc7677 { context: Some(json!({ "sponsor": "lightkit" })) },
        ..config()?
    };
    let client = client(&node, config).await?;
    client.send_user_operation(&call()?, &Default::default()).await?;

    let methods: Vec<String> = node
        .methods()
        .into_iter()
        .filter(|method| method.starts_with("pm_") || method == "eth_estimateUserOperationGas")
        .collect();
    assert_eq!(
        methods,
        vec!["pm_getPaymasterStubData", "eth_estimateUserOperationGas", "pm_getPaymasterData"]
    );

    // gas is estimated with the stub data
    let estimated = &node.calls("eth_estimateUserOperationGas")[0][0];
    assert_eq!(estimated["paymasterAndData"], json!(format!("{PAYMASTER}00")));
    assert_eq!(node.sent()[0].paymaster_and_data, final_data);
    Ok(())
}

#[tokio::test]
async fn erc7677_final_stub() -> eyre::Result<()> {
    let node = FakeNode::new();
    let stub = sponsored_paymaster_and_data();
    let data = stub.clone();
    node.on("pm_getPaymasterStubData", move |_, _| {
        Ok(json!({ "paymasterAndData": data, "isFinal": true }))
    });

    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Erc7677 { context: None },
        ..config()?
    };
    let client = client(&node, config).await?;
    client.send_user_operation(&call()?, &Default::default()).await?;

    assert!(node.calls("pm_getPaymasterData").is_empty());
    assert_eq!(node.calls("pm_getPaymasterStubData")[0][3], json!({}));
    assert_eq!(node.sent()[0].paymaster_and_data, stub);
    Ok(())
}

#[tokio::test]
async fn erc7677_sponsorship_v07_keeps_paymaster_gas_limits() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("pm_getPaymasterStubData", |_, _| {
        Ok(json!({
            "paymaster": PAYMASTER,
            "paymasterData": "0x00",
            "paymasterVerificationGasLimit": "0x186a0",
            "paymasterPostOpGasLimit": "0xc350"
        }))
    });
    node.on("eth_estimateUserOperationGas", |params, _| {
        assert_eq!(params[0]["paymasterVerificationGasLimit"], json!("0x186a0"));
        Ok(json!({
            "preVerificationGas": "0xc350",
            "verificationGasLimit": "0x186a0",
            "callGasLimit": "0x7530",
            "paymasterVerificationGasLimit": "0x30d40"
        }))
    });
    // the final sponsorship only returns the paymaster and its data
    node.on("pm_getPaymasterData", |params, _| {
        assert_eq!(params[0]["paymasterVerificationGasLimit"], json!("0x30d40"));
        assert_eq!(params[0]["paymasterPostOpGasLimit"], json!("0xc350"));
        Ok(json!({ "paymaster": PAYMASTER, "paymasterData": "0xcafe" }))
    });

    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Erc7677 { context: None },
        ..config_v07()?
    };
    let client = client(&node, config).await?;
    let submission = client.send_user_operation(&call()?, &Default::default()).await?;

    let sent = node.sent_v07();
    assert_eq!(sent.len(), 1);
    let uo = &sent[0];
    assert_eq!(uo.paymaster, Some(PAYMASTER.parse()?));
    assert_eq!(uo.paymaster_verification_gas_limit, Some(U256::from(200_000)));
    assert_eq!(uo.paymaster_post_op_gas_limit, Some(U256::from(50_000)));
    assert_eq!(uo.paymaster_data, Some("0xcafe".parse()?));
    assert!(uo.factory.is_some());

    // the signed hash covers the paymaster gas limits that were sent
    let request = UserOperationRequest::from(uo.clone());
    assert_eq!(request, submission.request);
    assert_eq!(
        request.hash(EntryPointVersion::V0_7, &EntryPointVersion::V0_7.address(), 1),
        submission.hash
    );
    Ok(())
}

#[tokio::test]
async fn vendor_sponsorship_v07() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("alchemy_requestGasAndPaymasterAndData", |params, _| {
        let request = &params[0];
        assert_eq!(request["entryPoint"], json!(EntryPointVersion::V0_7.address()));
        assert!(request["userOperation"].get("paymaster").is_none());
        assert!(request["userOperation"].get("factory").is_some());
        Ok(json!({
            "paymaster": PAYMASTER,
            "paymasterData": "0xbeef",
            "paymasterVerificationGasLimit": "0x2710",
            "paymasterPostOpGasLimit": "0x1388",
            "callGasLimit": "0x1000",
            "verificationGasLimit": "0x2000",
            "preVerificationGas": "0x3000",
            "maxFeePerGas": "0xc8",
            "maxPriorityFeePerGas": "0xb"
        }))
    });

    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Vendor { policy_id: "policy".into() },
        ..config_v07()?
    };
    let client = client(&node, config).await?;
    let submission = client.send_user_operation(&call()?, &Default::default()).await?;

    let uo = &node.sent_v07()[0];
    assert_eq!(uo.paymaster, Some(PAYMASTER.parse()?));
    assert_eq!(uo.paymaster_verification_gas_limit, Some(U256::from(10_000)));
    assert_eq!(uo.paymaster_post_op_gas_limit, Some(U256::from(5_000)));
    assert_eq!(uo.paymaster_data, Some("0xbeef".parse()?));
    assert_eq!(uo.call_gas_limit, U256::from(0x1000));
    assert_eq!(uo.max_fee_per_gas, U256::from(200));

    let request = UserOperationRequest::from(uo.clone());
    assert_eq!(
        request.hash(EntryPointVersion::V0_7, &EntryPointVersion::V0_7.address(), 1),
        submission.hash
    );
    Ok(())
}

#[tokio::test]
async fn bypass_paymaster() -> eyre::Result<()> {
    let node = FakeNode::new();
    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Erc7677 { context: None },
        ..config()?
    };
    let client = client(&node, config).await?;

    let overrides = UserOperationOverrides::default().paymaster_and_data(Bytes::default());
    client.send_user_operation(&call()?, &overrides).await?;
    assert!(node.methods().iter().all(|method| !method.starts_with("pm_")));
    assert!(node.sent()[0].paymaster_and_data.is_empty());

    // unsponsored account without funds
    node.on("eth_sendUserOperation", |_, _| {
        Err(rpc_error(-32500, "AA21 didn't pay prefund"))
    });
    let err = client.send_user_operation(&call()?, &overrides).await.unwrap_err();
    match err {
        ClientError::SubmissionRejected { code, message, nonce } => {
            assert_eq!(code, -32500);
            assert!(message.contains("AA21"));
            assert_eq!(nonce, U256::zero());
        }
        err => panic!("unexpected error {err:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn vendor_sponsorship() -> eyre::Result<()> {
    let node = FakeNode::new();
    let sponsored = sponsored_paymaster_and_data();
    let data = sponsored.clone();
    node.on("alchemy_requestGasAndPaymasterAndData", move |params, _| {
        let request = &params[0];
        assert_eq!(request["policyId"], json!("policy"));
        assert_eq!(request["overrides"]["maxFeePerGas"], json!("0xa0"));
        assert_eq!(request["overrides"]["maxPriorityFeePerGas"], json!("0xa"));
        Ok(json!({
            "paymasterAndData": data,
            "callGasLimit": "0x1000",
            "verificationGasLimit": "0x2000",
            "preVerificationGas": "0x3000",
            "maxFeePerGas": "0xc8",
            "maxPriorityFeePerGas": "0xb"
        }))
    });

    let config = lightkit_client::ClientConfig {
        paymaster: PaymasterMode::Vendor { policy_id: "policy".into() },
        ..config()?
    };
    let client = client(&node, config).await?;
    client.send_user_operation(&call()?, &Default::default()).await?;

    assert!(node.calls("eth_estimateUserOperationGas").is_empty());
    let uo = &node.sent()[0];
    assert_eq!(uo.paymaster_and_data, sponsored);
    assert_eq!(uo.call_gas_limit, U256::from(0x1000));
    assert_eq!(uo.verification_gas_limit, U256::from(0x2000));
    assert_eq!(uo.pre_verification_gas, U256::from(0x3000));
    assert_eq!(uo.max_fee_per_gas, U256::from(200));
    assert_eq!(uo.max_priority_fee_per_gas, U256::from(11));
    Ok(())
}

#[tokio::test]
async fn overridden_stages_are_skipped() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;

    let overrides = UserOperationOverrides::default()
        .nonce(7.into())
        .call_gas_limit(1.into())
        .verification_gas_limit(2.into())
        .pre_verification_gas(3.into())
        .max_fee_per_gas(4.into())
        .max_priority_fee_per_gas(5.into());
    let uo = client.build_user_operation(&call()?, &overrides).await?;

    assert!(node.calls("eth_call").is_empty());
    assert!(node.calls("eth_estimateUserOperationGas").is_empty());
    assert!(node.calls("eth_getBlockByNumber").is_empty());
    assert_eq!(uo.nonce, U256::from(7));
    assert_eq!(uo.call_gas_limit, U256::from(1));
    assert_eq!(uo.max_priority_fee_per_gas, U256::from(5));
    Ok(())
}

#[tokio::test]
async fn pinned_priority_fee() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;

    let overrides = UserOperationOverrides::default().max_priority_fee_per_gas(20.into());
    let uo = client.build_user_operation(&call()?, &overrides).await?;

    assert!(node.calls("eth_maxPriorityFeePerGas").is_empty());
    assert_eq!(uo.max_fee_per_gas, U256::from(150 + 20));
    assert_eq!(uo.max_priority_fee_per_gas, U256::from(20));
    Ok(())
}

#[tokio::test]
async fn failed_stage() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("eth_estimateUserOperationGas", |_, _| {
        Err(rpc_error(-32500, "AA23 reverted"))
    });
    let client = client(&node, config()?).await?;

    let err = client.send_user_operation(&call()?, &Default::default()).await.unwrap_err();
    match err {
        ClientError::MiddlewareStage { stage, nonce, message } => {
            assert_eq!(stage, "gas-estimator");
            assert_eq!(nonce, U256::zero());
            assert!(message.contains("AA23"));
        }
        err => panic!("unexpected error {err:?}"),
    }
    assert!(node.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn wait_for_receipt() -> eyre::Result<()> {
    let node = FakeNode::new();
    // mined on the third poll
    node.on("eth_getUserOperationReceipt", |params, history| {
        let polls =
            history.iter().filter(|call| call.method == "eth_getUserOperationReceipt").count();
        Ok(if polls < 2 { Value::Null } else { receipt(&params[0]) })
    });
    let client = client(&node, config()?).await?;

    let mut submission = client.send_user_operation(&call()?, &Default::default()).await?;
    let receipt = client.wait(&mut submission).await?;

    assert_eq!(receipt.user_op_hash, submission.hash);
    assert_eq!(submission.state, SubmissionState::Confirmed);
    assert_eq!(submission.receipt, Some(receipt));
    assert_eq!(node.calls("eth_getUserOperationByHash").len(), 2);
    Ok(())
}

#[tokio::test]
async fn wait_times_out() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("eth_getUserOperationReceipt", |_, _| Ok(Value::Null));
    let config = lightkit_client::ClientConfig {
        wait: WaitConfig { timeout: 50, poll_interval: 10, interval_multiplier: 150 },
        ..config()?
    };
    let client = client(&node, config).await?;

    let mut submission = client.send_user_operation(&call()?, &Default::default()).await?;
    let err = client.wait(&mut submission).await.unwrap_err();

    assert!(err.is_dropped());
    assert!(err.to_string().contains("not mined within 50ms"));
    assert_eq!(submission.state, SubmissionState::Dropped);
    Ok(())
}

#[tokio::test]
async fn drop_and_replace() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;

    let stale = client.send_user_operation(&call()?, &Default::default()).await?;
    let replacement =
        client.drop_and_replace_user_operation(&stale.request, &Default::default()).await?;

    assert_eq!(replacement.nonce(), stale.nonce());
    assert_ne!(replacement.hash, stale.hash);
    assert_eq!(replacement.replaces, Some(stale.hash));
    assert_eq!(replacement.request.call_data, stale.request.call_data);
    // the fresh estimate is lower than the bumped stale fees
    assert_eq!(replacement.request.max_fee_per_gas, U256::from(176));
    assert_eq!(replacement.request.max_priority_fee_per_gas, U256::from(11));
    assert_eq!(node.sent().len(), 2);
    Ok(())
}

#[tokio::test]
async fn drop_and_replace_follows_fee_market() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;
    let stale = client.send_user_operation(&call()?, &Default::default()).await?;

    node.on("eth_getBlockByNumber", |_, _| Ok(json!({ "baseFeePerGas": "0x3e8" })));
    node.on("eth_maxPriorityFeePerGas", |_, _| Ok(json!("0x64")));
    let replacement =
        client.drop_and_replace_user_operation(&stale.request, &Default::default()).await?;

    assert_eq!(replacement.request.max_fee_per_gas, U256::from(1500 + 100));
    assert_eq!(replacement.request.max_priority_fee_per_gas, U256::from(100));
    Ok(())
}

#[tokio::test]
async fn send_and_wait_replaces_evicted_operation() -> eyre::Result<()> {
    let node = FakeNode::new();
    // the first user operation is evicted, the replacement is mined
    let sends = |history: &[common::Call]| {
        history.iter().filter(|call| call.method == "eth_sendUserOperation").count()
    };
    node.on("eth_getUserOperationReceipt", move |params, history| {
        Ok(if sends(history) < 2 { Value::Null } else { receipt(&params[0]) })
    });
    node.on("eth_getUserOperationByHash", |_, _| Ok(Value::Null));
    let client = client(&node, config()?).await?;

    let submission = client.send_and_wait(&call()?, &Default::default(), true).await?;

    assert_eq!(submission.state, SubmissionState::Confirmed);
    assert!(submission.replaces.is_some());
    let sent = node.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].nonce, sent[1].nonce);
    Ok(())
}

#[tokio::test]
async fn send_and_wait_without_replacement() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("eth_getUserOperationReceipt", |_, _| Ok(Value::Null));
    node.on("eth_getUserOperationByHash", |_, _| Ok(Value::Null));
    let client = client(&node, config()?).await?;

    let err = client.send_and_wait(&call()?, &Default::default(), false).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::OperationDropped { ref reason, .. } if reason.contains("evicted")
    ));
    assert_eq!(node.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn sign_message_6492_until_deployed() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;
    let message = Bytes::from(b"hello".to_vec());

    let signature = client.sign_message(message.clone()).await?;
    assert!(is_6492_signature(&signature));

    node.on("eth_getCode", |_, _| Ok(json!("0x60806040")));
    let signature = client.sign_message(message.clone()).await?;
    assert_eq!(signature.len(), 65);

    // explicit wrapping ignores the deployment
    let signature = client.sign_message_with_6492(message).await?;
    assert!(is_6492_signature(&signature));
    Ok(())
}

#[tokio::test]
async fn deployed_account_has_no_init_code() -> eyre::Result<()> {
    let node = FakeNode::new();
    node.on("eth_getCode", |_, _| Ok(json!("0x60806040")));
    let client = client(&node, config()?).await?;

    let uo = client.build_user_operation(&call()?, &Default::default()).await?;
    assert!(uo.init_code.is_empty());
    Ok(())
}

#[tokio::test]
async fn transfer_ownership() -> eyre::Result<()> {
    let node = FakeNode::new();
    let client = client(&node, config()?).await?;
    let new_owner: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse()?;

    let submission = client.transfer_ownership(new_owner, &Default::default(), true).await?;
    assert_eq!(submission.state, SubmissionState::Confirmed);

    let call_data = hex::encode_prefixed(&node.sent()[0].call_data);
    // execute(account, 0, transferOwnership(new_owner))
    assert!(call_data.starts_with("0xb61d27f6"));
    assert!(call_data.contains(&format!("{:x}", client.address()).to_lowercase()));
    assert!(call_data.contains(&format!("f2fde38b{:0>64}", format!("{new_owner:x}"))));
    Ok(())
}

#[tokio::test]
async fn v2_account_address() -> eyre::Result<()> {
    let node = FakeNode::new();
    let config = lightkit_client::ClientConfig {
        version: AccountVersion::V2_0_0,
        account_address: None,
        ..config()?
    };
    let client = client(&node, config).await?;

    let expected: Address = "0x11c50cce08ff4ca8294592e282442a3f0a38cfd9".parse()?;
    assert_eq!(client.address(), expected);
    assert_eq!(client.get_owner_address().await?, common::owner());
    Ok(())
}
