use alloy_primitives::{address, b256, hex, Address, B256};
use claimtree_core::{AuthorizeKSignClaim, Claim, ClaimEncoding, SetRootClaim, EMPTY_NODE_VALUE};
use claimtree_smt::{check_proof, MemoryStore, Proof, Tree};

const LEVELS: usize = 140;
const KSIGN_KEY: Address = address!("ee602447b5a75cf4f25367f5d199b860844d10c4");
const RELAY_IDENTITY: Address = address!("d79ae0a65e7dd29db1eac700368e693de09610b8");
const KSIGN_ROOT: B256 = b256!("93bf43768a1e034e583832a9ee992c37374047be910aa1e80258fc2f27d46628");

fn ksign_tree() -> (Tree<MemoryStore>, Claim) {
    let claim: Claim = AuthorizeKSignClaim::new_operational(KSIGN_KEY).into();
    let mut tree = Tree::new(MemoryStore::new(), LEVELS).unwrap();
    tree.add(&claim).unwrap();
    (tree, claim)
}

#[test]
fn operational_ksign_existence_proof() {
    let (tree, claim) = ksign_tree();

    assert_eq!(
        claim.to_hex(),
        "0x3cfc3a1edbf691316fec9b75970fbfb2b0e8d8edfc6ec7628db77c4969403074353f867ef725411de05e3d4b0a01c37cf7ad24bcc213141a0000005400000000ee602447b5a75cf4f25367f5d199b860844d10c4000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000ffffffffffffffff"
    );
    assert_eq!(tree.root(), KSIGN_ROOT);

    let proof = tree.generate_proof(&claim.hi()).unwrap();
    assert_eq!(proof.to_bytes(), vec![0u8; 33]);
    assert!(check_proof(&KSIGN_ROOT, &proof, &claim.hi(), &claim.ht(), LEVELS));

    assert_eq!(tree.claim_bytes(&claim.ht()).unwrap(), Some(claim.to_bytes()));
}

#[test]
fn operational_ksign_next_version_non_existence_proof() {
    let (tree, claim) = ksign_tree();
    let bumped = claim.with_version(1);

    assert_eq!(
        bumped.hi(),
        b256!("eab0608b8891dcca4f421c69244b17f208fbed899b540d01115ca7d907cbf6a5")
    );

    let proof = tree.generate_proof(&bumped.hi()).unwrap();
    assert_eq!(
        proof.to_bytes(),
        hex!("00000000000000000000000000000000000000000000000000000000000000000103aab4f597fe23598cc10f1af68192195a7538d3d6fc83cf49e5cfd53eaac527")
    );
    assert!(check_proof(&KSIGN_ROOT, &proof, &bumped.hi(), &EMPTY_NODE_VALUE, LEVELS));
    assert!(!check_proof(&KSIGN_ROOT, &proof, &bumped.hi(), &bumped.ht(), LEVELS));

    // Same statement backed by the divergent leaf instead of a folded sibling
    let aux_proof = tree.generate_proof_with_aux(&bumped.hi()).unwrap();
    assert_eq!(aux_proof.aux().map(|aux| aux.hi), Some(tree_leaf_hi()));
    assert!(check_proof(&KSIGN_ROOT, &aux_proof, &bumped.hi(), &EMPTY_NODE_VALUE, LEVELS));
}

fn tree_leaf_hi() -> B256 {
    b256!("68be938284f64944bd8ebc172792687f680fb8db13e383227c8c668820b40078")
}

#[test]
fn set_root_into_relay_tree() {
    let claim: Claim = SetRootClaim::new(RELAY_IDENTITY, KSIGN_ROOT).into();
    assert_eq!(
        claim.to_hex(),
        "0x3cfc3a1edbf691316fec9b75970fbfb2b0e8d8edfc6ec7628db77c49694030749b9a76a0132a0814192c05c9321efc30c7286f6187f18fc60000005400000000d79ae0a65e7dd29db1eac700368e693de09610b893bf43768a1e034e583832a9ee992c37374047be910aa1e80258fc2f27d46628"
    );
    assert_eq!(
        claim.hi(),
        b256!("497d8626567f90e3e14de025961133ca7e4959a686c75a062d4d4db750d607b0")
    );
    assert_eq!(
        claim.ht(),
        b256!("6da033d96fdde2c687a48a4902823f9f8e91b31e3d73c57f3858e8a9650f9c39")
    );

    let mut relay = Tree::new(MemoryStore::new(), LEVELS).unwrap();
    relay.add(&claim).unwrap();
    let relay_root = b256!("ab63a4a3c5fe879e1b55315b945ac7f1ac1ac4b059e7301964b99b6813b514c7");
    assert_eq!(relay.root(), relay_root);

    let proof = relay.generate_proof(&claim.hi()).unwrap();
    assert_eq!(proof.to_bytes(), vec![0u8; 33]);

    let next = claim.with_version(1);
    let proof = relay.generate_proof(&next.hi()).unwrap();
    assert_eq!(
        proof.to_hex(),
        "0x0000000000000000000000000000000000000000000000000000000000000000016f33cf71ff7bdbc492f9c3bd63b15577e6cedc70afd09051e1dfe2f04340c073"
    );
    assert!(check_proof(&relay_root, &proof, &next.hi(), &EMPTY_NODE_VALUE, LEVELS));
}

#[test]
fn reference_proof_decodes() {
    let proof = Proof::from_hex(
        "0x00000000000000000000000000000000000000000000000000000000000000000103aab4f597fe23598cc10f1af68192195a7538d3d6fc83cf49e5cfd53eaac527",
    )
    .unwrap();
    assert_eq!(proof.siblings().len(), 1);
    assert!(proof.aux().is_none());
}
