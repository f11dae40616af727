#[cfg(test)]
mod ens_tests {
    use std::time::Duration;

    use crate::mocks::rpc_node::{EnsFixtures, MockRpcNode};
    use assert_matches::assert_matches;
    use resolver::{
        EnsResolver, NameResolver,
        ens::{ENS_REGISTRY, dns_encode},
    };
    use types::{address::Address, errors::PayError};

    fn addr(last: u8) -> Address {
        let mut bytes = [0x11u8; 20];
        bytes[19] = last;
        Address::from_bytes(bytes)
    }

    fn resolver_for(node: &MockRpcNode) -> EnsResolver {
        EnsResolver::new(node.url.clone(), Some(Duration::from_secs(5))).unwrap()
    }

    fn registry_resolver_for(node: &MockRpcNode) -> EnsResolver {
        resolver_for(node).with_registry(ENS_REGISTRY.parse().unwrap())
    }

    #[tokio::test]
    async fn resolves_name_through_universal_resolver() {
        let node = MockRpcNode::start(EnsFixtures::new().with_name("alice.eth", addr(1), addr(2)))
            .unwrap();

        let resolved = resolver_for(&node).resolve_name("alice.eth").await.unwrap();
        assert_eq!(resolved, Some(addr(2)));

        let calls = node.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["method"], "eth_call");
        assert_eq!(
            calls[0]["params"][0]["to"],
            "0xce01f8eee7E479C928F8919abD53E553a36CeF67"
        );
        assert_eq!(calls[0]["params"][1], "latest");
        // resolve(bytes,bytes) carrying the DNS-encoded name
        let data = calls[0]["params"][0]["data"].as_str().unwrap();
        assert!(data.starts_with("0x9061b923"));
        assert!(data.contains(&hex::encode(dns_encode("alice.eth"))));

        node.stop().await;
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let node = MockRpcNode::start(EnsFixtures::new().with_name("alice.eth", addr(1), addr(2)))
            .unwrap();

        let resolved = resolver_for(&node).resolve_name(" Alice.ETH ").await.unwrap();
        assert_eq!(resolved, Some(addr(2)));

        node.stop().await;
    }

    #[tokio::test]
    async fn unregistered_name_is_none() {
        let node = MockRpcNode::start(EnsFixtures::new()).unwrap();

        // The universal resolver reverts with ResolverNotFound.
        let resolved = resolver_for(&node).resolve_name("nobody.eth").await.unwrap();
        assert_eq!(resolved, None);
        assert_eq!(node.calls().len(), 1);

        node.stop().await;
    }

    #[tokio::test]
    async fn missing_address_record_is_none() {
        let node = MockRpcNode::start(EnsFixtures::new().with_resolver_only("bob.eth", addr(3)))
            .unwrap();

        let resolved = resolver_for(&node).resolve_name("bob.eth").await.unwrap();
        assert_eq!(resolved, None);

        node.stop().await;
    }

    #[tokio::test]
    async fn wildcard_subname_resolves() {
        let node = MockRpcNode::start(
            EnsFixtures::new().with_wildcard("pay.eth", addr(4), addr(5)),
        )
        .unwrap();

        let resolved = resolver_for(&node)
            .resolve_name("shop.pay.eth")
            .await
            .unwrap();
        assert_eq!(resolved, Some(addr(5)));

        // The registry has no entry for the subname itself.
        let resolved = registry_resolver_for(&node)
            .resolve_name("shop.pay.eth")
            .await
            .unwrap();
        assert_eq!(resolved, None);

        node.stop().await;
    }

    #[tokio::test]
    async fn offchain_name_resolves_through_gateway() {
        let node = MockRpcNode::start(EnsFixtures::new().with_offchain_name("cb.id.eth", addr(6)))
            .unwrap();

        let resolved = resolver_for(&node).resolve_name("CB.id.eth").await.unwrap();
        assert_eq!(resolved, Some(addr(6)));

        // resolve(...) reverts with OffchainLookup, then resolveCallback(...)
        let calls = node.calls();
        assert_eq!(calls.len(), 2);
        let callback = calls[1]["params"][0]["data"].as_str().unwrap();
        assert!(callback.starts_with("0xb4a85801"));

        let requests = node.gateway_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("0xce01f8eee7e479c928f8919abd53e553a36cef67/0x3b3b57de"));

        node.stop().await;
    }

    #[tokio::test]
    async fn offchain_gateway_failure_is_a_resolution_error() {
        let node = MockRpcNode::start(
            EnsFixtures::new()
                .with_offchain_name("cb.id.eth", addr(6))
                .gateway_down(),
        )
        .unwrap();

        let result = resolver_for(&node).resolve_name("cb.id.eth").await;
        assert_matches!(result, Err(PayError::Resolution(message)) if message.contains("502"));
        assert_eq!(node.calls().len(), 1);

        node.stop().await;
    }

    #[tokio::test]
    async fn registry_lookup_uses_two_calls() {
        let node = MockRpcNode::start(EnsFixtures::new().with_name("alice.eth", addr(1), addr(2)))
            .unwrap();

        let resolved = registry_resolver_for(&node)
            .resolve_name("alice.eth")
            .await
            .unwrap();
        assert_eq!(resolved, Some(addr(2)));

        let calls = node.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0]["params"][0]["to"],
            "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"
        );
        assert_eq!(calls[1]["params"][0]["to"], addr(1).to_string());

        node.stop().await;
    }

    #[tokio::test]
    async fn registry_lookup_without_resolver_stops_early() {
        let node = MockRpcNode::start(EnsFixtures::new()).unwrap();

        let resolved = registry_resolver_for(&node)
            .resolve_name("nobody.eth")
            .await
            .unwrap();
        assert_eq!(resolved, None);
        // No resolver, so no second call.
        assert_eq!(node.calls().len(), 1);

        node.stop().await;
    }

    #[tokio::test]
    async fn registry_lookup_cannot_follow_offchain_names() {
        let node = MockRpcNode::start(EnsFixtures::new().with_offchain_name("cb.id.eth", addr(6)))
            .unwrap();

        let resolved = registry_resolver_for(&node)
            .resolve_name("cb.id.eth")
            .await
            .unwrap();
        assert_eq!(resolved, None);
        assert!(node.gateway_requests().is_empty());

        node.stop().await;
    }

    #[tokio::test]
    async fn malformed_name_skips_rpc() {
        let node = MockRpcNode::start(EnsFixtures::new()).unwrap();

        let resolved = resolver_for(&node).resolve_name("alice..eth").await.unwrap();
        assert_eq!(resolved, None);
        assert!(node.calls().is_empty());

        node.stop().await;
    }

    #[tokio::test]
    async fn rpc_error_is_a_resolution_error() {
        let node = MockRpcNode::start(EnsFixtures::new().failing("header not found")).unwrap();

        let result = resolver_for(&node).resolve_name("alice.eth").await;
        assert_matches!(result, Err(PayError::Resolution(message)) if message.contains("header not found"));

        node.stop().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_resolution_error() {
        let resolver = EnsResolver::new("http://127.0.0.1:9/", Some(Duration::from_secs(5))).unwrap();

        let result = resolver.resolve_name("alice.eth").await;
        assert_matches!(result, Err(PayError::Resolution(_)));
    }
}
