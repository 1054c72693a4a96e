use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Erc20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Destination routing for a cross-chain teller message.
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct BridgeData {
        uint32 chainSelector;
        address destinationChainReceiver;
        address bridgeFeeToken;
        uint64 messageGas;
        bytes data;
    }

    #[sol(rpc)]
    contract Teller {
        function deposit(address depositAsset, uint256 depositAmount, uint256 minimumMint) external payable returns (uint256);
        function depositAndBridge(address depositAsset, uint256 depositAmount, uint256 minimumMint, BridgeData calldata data) external payable;
        function bridge(uint256 shareAmount, BridgeData calldata data) external payable;
        function previewFee(uint256 shareAmount, BridgeData calldata data) external view returns (uint256);
    }

    #[sol(rpc)]
    contract Accountant {
        function getRate() external view returns (uint256);
        function getRateInQuoteSafe(address quote) external view returns (uint256);
    }

    /// A standing redemption offer: sell `offerAmount` shares at `atomicPrice` until `deadline`.
    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct AtomicRequest {
        uint64 deadline;
        uint256 atomicPrice;
        uint256 offerAmount;
        bool inSolve;
    }

    #[sol(rpc)]
    contract AtomicQueue {
        function updateAtomicRequest(address offer, address want, AtomicRequest calldata userRequest) external;
    }

    /// Chainlink-style aggregator, answers scaled by 1e8.
    #[sol(rpc)]
    contract PriceFeed {
        function latestAnswer() external view returns (int256);
    }
}
