//! Multi-party key generation on small parameters
//!
//! Every party derives the same CRS, publishes a public key share, the shares
//! are aggregated into the joint public key, and each party then generates
//! its bootstrapping key share. The tests decrypt the shares with the
//! individual and joint secret keys.

use threshold_fhew::codec::tag;
use threshold_fhew::math::{GadgetVector, ModQ, Poly, Ring};
use threshold_fhew::rlwe::automorphism_small;
use threshold_fhew::{
    Codec, FhewBootstrappingKeyShare, FhewCrs, FhewError, FhewParam, FhewParamConfig,
    LweCiphertext, LweSecretKey, Modulus, RlwePublicKey, RlwePublicKeyShare, RlweSecretKey,
    SecretDistribution, Seed, I_4P,
};

const CRS_SEED: Seed = Seed::new([7u8; 32]);

fn test_params(modulus: Modulus) -> FhewParam {
    FhewParam::new(FhewParamConfig {
        modulus,
        ring_size: 256,
        lwe_dimension: 16,
        q: 512,
        ..I_4P
    })
    .expect("valid test parameters")
}

struct Party {
    sk: RlweSecretKey,
    sk_ks: LweSecretKey,
    seed: Seed,
}

fn parties(param: &FhewParam) -> Vec<Party> {
    (0..param.total_shares())
        .map(|i| {
            let seed = Seed::new([i as u8 + 1; 32]);
            Party {
                sk: RlweSecretKey::sample(param.ring_size(), param.sk_distribution(), &seed).unwrap(),
                sk_ks: LweSecretKey::sample(param.lwe_dimension(), param.lwe_sk_distribution(), &seed)
                    .unwrap(),
                seed,
            }
        })
        .collect()
}

fn joint_pk(param: &FhewParam, crs: &FhewCrs, parties: &[Party]) -> RlwePublicKey {
    let shares: Vec<RlwePublicKeyShare> = parties
        .iter()
        .enumerate()
        .map(|(i, p)| RlwePublicKeyShare::generate(param, crs, i, &p.sk, &p.seed).unwrap())
        .collect();
    RlwePublicKey::aggregate(param, crs, &shares).unwrap()
}

fn joint_sk(parties: &[Party]) -> RlweSecretKey {
    let n = parties[0].sk.ring_size();
    let coeffs = (0..n)
        .map(|i| parties.iter().map(|p| p.sk.coeffs()[i]).sum())
        .collect();
    RlweSecretKey::from_coeffs(coeffs)
}

fn joint_lwe_sk(parties: &[Party]) -> LweSecretKey {
    let n = parties[0].sk_ks.dimension();
    let coeffs = (0..n)
        .map(|i| parties.iter().map(|p| p.sk_ks.coeffs()[i]).sum())
        .collect();
    LweSecretKey::from_coeffs(coeffs)
}

fn all_shares(param: &FhewParam, crs: &FhewCrs, parties: &[Party]) -> Vec<FhewBootstrappingKeyShare> {
    let pk = joint_pk(param, crs, parties);
    parties
        .iter()
        .enumerate()
        .map(|(i, p)| {
            FhewBootstrappingKeyShare::generate(param, crs, i, &p.sk, &pk, &p.sk_ks, &p.seed).unwrap()
        })
        .collect()
}

fn noise_bound(param: &FhewParam) -> u64 {
    param.noise_distribution().sampler().unwrap().bound() as u64
}

#[test]
fn test_shapes_match_across_parties() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let shares = all_shares(&param, &crs, &parties);

    let lens: Vec<usize> = shares.iter().map(|s| s.to_bytes().len()).collect();
    assert!(lens.windows(2).all(|w| w[0] == w[1]), "encodings differ in length: {:?}", lens);

    for share in &shares {
        let indices: Vec<usize> = share.auto_key_shares().keys().copied().collect();
        let mut expected = param.auto_indices();
        expected.sort_unstable();
        assert_eq!(indices, expected);
        assert!(share
            .auto_key_shares()
            .values()
            .all(|k| k.level() == param.auto_decomposition_param().level as usize));

        let decomp = param.rgsw_by_rgsw_decomposition_param();
        assert_eq!(share.brk_share().len(), param.lwe_dimension());
        assert!(share
            .brk_share()
            .iter()
            .all(|c| c.level_a() == decomp.level_a as usize && c.level_b() == decomp.level_b as usize));
        assert_eq!(share.lwe_ks_share().ring_size(), param.ring_size());
    }
}

#[test]
fn test_auto_keys_decrypt() {
    for modulus in [Modulus::Prime(18014398509404161), Modulus::PowerOfTwo(64)] {
        let param = test_params(modulus);
        let crs = FhewCrs::derive(CRS_SEED, &param);
        let parties = parties(&param);
        let shares = all_shares(&param, &crs, &parties);
        let ring = Ring::new(param.ring_mod(), param.ring_size());
        let decomp = param.auto_decomposition_param();
        let gadget = GadgetVector::new(param.ring_mod(), decomp.log_base, decomp.level);
        let bound = noise_bound(&param);

        // each party's rows under its own key
        for (party, share) in parties.iter().zip(&shares) {
            for k in param.auto_indices() {
                let s_k = Poly::from_signed(&automorphism_small(party.sk.coeffs(), k), param.ring_mod());
                let rows = share.auto_key_ciphertexts(k).unwrap();
                for (ct, &g) in rows.iter().zip(gadget.values()) {
                    let noise = &ct.phase(&ring, &party.sk) - &s_k.scalar_mul(g);
                    assert!(noise.linf_norm() <= bound, "k = {}", k);
                }
            }
        }

        // bodies summed over parties decrypt under the joint key
        let sk = joint_sk(&parties);
        let total = parties.len() as u64;
        for k in param.auto_indices() {
            let s_k = Poly::from_signed(&automorphism_small(sk.coeffs(), k), param.ring_mod());
            let rows = shares[0].auto_key_ciphertexts(k).unwrap();
            for (j, (ct, &g)) in rows.iter().zip(gadget.values()).enumerate() {
                let mut b = ct.b.clone();
                for share in &shares[1..] {
                    b += &share.auto_key_shares()[&k].bodies()[j];
                }
                let joint = threshold_fhew::RlweCiphertext::from_parts(ct.a.clone(), b);
                let noise = &joint.phase(&ring, &sk) - &s_k.scalar_mul(g);
                assert!(noise.linf_norm() <= total * bound);
            }
        }

        assert!(shares[0].auto_key_ciphertexts(3).is_none());
    }
}

#[test]
fn test_brk_decrypts_under_joint_key() {
    for modulus in [Modulus::Prime(18014398509404161), Modulus::PowerOfTwo(64)] {
        let param = test_params(modulus);
        let crs = FhewCrs::derive(CRS_SEED, &param);
        let parties = parties(&param);
        let shares = all_shares(&param, &crs, &parties);
        let ring = Ring::new(param.ring_mod(), param.ring_size());
        let decomp = param.rgsw_by_rgsw_decomposition_param();
        let gadget_a = GadgetVector::new(param.ring_mod(), decomp.log_base, decomp.level_a);
        let gadget_b = GadgetVector::new(param.ring_mod(), decomp.log_base, decomp.level_b);
        let sk = joint_sk(&parties);
        let two_n = 2 * param.ring_size() as i64;
        let factor = param.embedding_factor() as i64;

        for (party, share) in parties.iter().zip(&shares) {
            for (rgsw, &z) in share.brk_share().iter().zip(party.sk_ks.coeffs()) {
                let exp = (z as i64 * factor).rem_euclid(two_n) as usize;
                let noise = rgsw.max_noise(&ring, &sk, exp, &gadget_a, &gadget_b);
                assert!(noise < 1 << 30, "noise {} too large", noise);
            }
        }
    }
}

#[test]
fn test_lwe_ks_decrypts() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let shares = all_shares(&param, &crs, &parties);
    let lwe_mod = param.lwe_mod();
    let decomp = param.lwe_ks_decomposition_param();
    let gadget = GadgetVector::new(lwe_mod, decomp.log_base, decomp.level);
    let bound = param.lwe_noise_distribution().sampler().unwrap().bound();

    let centered_noise = |phase: u64, message: i64, modulus: ModQ| {
        modulus.to_i64(modulus.sub(phase, modulus.from_i64(message))).abs()
    };

    for (party, share) in parties.iter().zip(&shares) {
        for i in 0..param.ring_size() {
            for (j, &g) in gadget.values().iter().enumerate() {
                let ct = share.lwe_ks_ciphertext(i, j).unwrap();
                let m = party.sk.coeffs()[i] as i64 * g as i64;
                assert!(centered_noise(ct.phase(&party.sk_ks, lwe_mod), m, lwe_mod) <= bound);
            }
        }
    }

    let sk = joint_sk(&parties);
    let sk_ks = joint_lwe_sk(&parties);
    for i in [0, 1, param.ring_size() - 1] {
        for (j, &g) in gadget.values().iter().enumerate() {
            let b = shares
                .iter()
                .fold(0, |acc, s| lwe_mod.add(acc, s.lwe_ks_share().body(i, j)));
            let ct = LweCiphertext::from_parts(crs.lwe_ks_a(i, j), b);
            let m = sk.coeffs()[i] as i64 * g as i64;
            assert!(centered_noise(ct.phase(&sk_ks, lwe_mod), m, lwe_mod) <= 4 * bound);
        }
    }

    assert!(shares[0].lwe_ks_ciphertext(param.ring_size(), 0).is_none());
    assert!(shares[0].lwe_ks_ciphertext(0, decomp.level as usize).is_none());
}

#[test]
fn test_parties_are_independent() {
    let param = test_params(Modulus::PowerOfTwo(64));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let pk = joint_pk(&param, &crs, &parties);

    let sequential: Vec<_> = parties
        .iter()
        .enumerate()
        .map(|(i, p)| {
            FhewBootstrappingKeyShare::generate(&param, &crs, i, &p.sk, &pk, &p.sk_ks, &p.seed).unwrap()
        })
        .collect();

    // concurrently and in reverse order, each party with its own CRS copy
    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = parties
            .iter()
            .enumerate()
            .rev()
            .map(|(i, p)| {
                let pk = &pk;
                let param = &param;
                scope.spawn(move || {
                    let crs = FhewCrs::derive(CRS_SEED, param);
                    FhewBootstrappingKeyShare::generate(param, &crs, i, &p.sk, pk, &p.sk_ks, &p.seed)
                        .unwrap()
                })
            })
            .collect();
        let mut out: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        out.reverse();
        out
    });

    assert_eq!(sequential, concurrent);
    assert_ne!(sequential[0].brk_share(), sequential[1].brk_share());
}

#[test]
fn test_pk_aggregation() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let shares: Vec<RlwePublicKeyShare> = parties
        .iter()
        .enumerate()
        .map(|(i, p)| RlwePublicKeyShare::generate(&param, &crs, i, &p.sk, &p.seed).unwrap())
        .collect();

    for share in &shares {
        assert_eq!(&RlwePublicKeyShare::from_bytes(&share.to_bytes()).unwrap(), share);
    }

    // order of shares does not matter
    let pk = RlwePublicKey::aggregate(&param, &crs, &shares).unwrap();
    let mut reversed = shares.clone();
    reversed.reverse();
    assert_eq!(RlwePublicKey::aggregate(&param, &crs, &reversed).unwrap(), pk);
    assert_eq!(pk.a, crs.pk_a());

    // pk is an encryption of zero under the joint key
    let ring = Ring::new(param.ring_mod(), param.ring_size());
    let phase = pk.as_ciphertext().phase(&ring, &joint_sk(&parties));
    assert!(phase.linf_norm() <= parties.len() as u64 * noise_bound(&param));

    assert!(matches!(
        RlwePublicKey::aggregate(&param, &crs, &shares[..3]),
        Err(FhewError::InvalidParameter(_))
    ));
    let duplicated = vec![shares[0].clone(), shares[1].clone(), shares[2].clone(), shares[0].clone()];
    assert!(matches!(
        RlwePublicKey::aggregate(&param, &crs, &duplicated),
        Err(FhewError::InvalidParameter(_))
    ));
}

#[test]
fn test_codec_roundtrip_all_types() {
    let param = test_params(Modulus::PowerOfTwo(64));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let pk = joint_pk(&param, &crs, &parties);
    let p = &parties[1];
    let share =
        FhewBootstrappingKeyShare::generate(&param, &crs, 1, &p.sk, &pk, &p.sk_ks, &p.seed).unwrap();

    assert_eq!(FhewParam::from_bytes(&param.to_bytes()).unwrap(), param);
    assert_eq!(FhewCrs::from_bytes(&crs.to_bytes()).unwrap(), crs);
    assert_eq!(RlweSecretKey::from_bytes(&p.sk.to_bytes()).unwrap(), p.sk);
    assert_eq!(LweSecretKey::from_bytes(&p.sk_ks.to_bytes()).unwrap(), p.sk_ks);
    assert_eq!(RlwePublicKey::from_bytes(&pk.to_bytes()).unwrap(), pk);

    let bytes = share.to_bytes();
    let decoded = FhewBootstrappingKeyShare::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, share);
    assert_eq!(decoded.to_bytes(), bytes);
}

#[test]
fn test_share_decode_rejections() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let p = &parties[0];
    let pk = p.sk.pk_from_seed(&param, &p.seed).unwrap();
    let share =
        FhewBootstrappingKeyShare::generate(&param, &crs, 0, &p.sk, &pk, &p.sk_ks, &p.seed).unwrap();
    let bytes = share.to_bytes();

    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(truncated),
        Err(FhewError::TruncatedInput { .. })
    ));

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(&trailing),
        Err(FhewError::MalformedEncoding(_))
    ));

    let mut wrong_tag = bytes.clone();
    wrong_tag[0] = tag::CRS;
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(&wrong_tag),
        Err(FhewError::MalformedEncoding(_))
    ));

    let mut wrong_version = bytes.clone();
    wrong_version[1] = 2;
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(&wrong_version),
        Err(FhewError::MalformedEncoding(_))
    ));

    // share index follows the parameter body and the CRS seed
    let idx_offset = param.to_bytes().len() + Seed::LEN;
    let mut bad_idx = bytes.clone();
    bad_idx[idx_offset..idx_offset + 4].copy_from_slice(&4u32.to_le_bytes());
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(&bad_idx),
        Err(FhewError::MalformedEncoding(_))
    ));

    // first automorphism coefficient set to 2^54 - 1, above the modulus
    let coeff = idx_offset + 4;
    let mut unreduced = bytes.clone();
    unreduced[coeff..coeff + 6].fill(0xFF);
    unreduced[coeff + 6] |= 0x3F;
    assert!(matches!(
        FhewBootstrappingKeyShare::from_bytes(&unreduced),
        Err(FhewError::MalformedEncoding(_))
    ));
}

#[test]
fn test_generate_rejects_foreign_crs() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let other = test_params(Modulus::PowerOfTwo(64));
    let crs = FhewCrs::derive(CRS_SEED, &other);
    let parties = parties(&param);
    let p = &parties[0];
    let pk = p.sk.pk_from_seed(&param, &p.seed).unwrap();

    assert_eq!(
        FhewBootstrappingKeyShare::generate(&param, &crs, 0, &p.sk, &pk, &p.sk_ks, &p.seed),
        Err(FhewError::CrsParameterMismatch)
    );
    assert_eq!(
        RlwePublicKeyShare::generate(&param, &crs, 0, &p.sk, &p.seed),
        Err(FhewError::CrsParameterMismatch)
    );
    assert!(matches!(
        RlwePublicKeyShare::generate(&param, &FhewCrs::derive(CRS_SEED, &param), 4, &p.sk, &p.seed),
        Err(FhewError::InvalidPartyIndex { index: 4, total: 4 })
    ));

    // ternary and gaussian keys both feed generation
    let gaussian = RlweSecretKey::sample(param.ring_size(), SecretDistribution::Gaussian(3.19), &p.seed).unwrap();
    let crs = FhewCrs::derive(CRS_SEED, &param);
    assert!(FhewBootstrappingKeyShare::generate(&param, &crs, 0, &gaussian, &pk, &p.sk_ks, &p.seed).is_ok());
}

#[test]
fn test_keys_survive_json_transit() {
    let param = test_params(Modulus::Prime(18014398509404161));
    let crs = FhewCrs::derive(CRS_SEED, &param);
    let parties = parties(&param);
    let pk = joint_pk(&param, &crs, &parties);
    let p = &parties[2];

    let sk: RlweSecretKey = serde_json::from_str(&serde_json::to_string(&p.sk).unwrap()).unwrap();
    let sk_ks: LweSecretKey = serde_json::from_str(&serde_json::to_string(&p.sk_ks).unwrap()).unwrap();
    let pk_json: RlwePublicKey = serde_json::from_str(&serde_json::to_string(&pk).unwrap()).unwrap();
    assert_eq!(
        FhewBootstrappingKeyShare::generate(&param, &crs, 2, &sk, &pk_json, &sk_ks, &p.seed).unwrap(),
        FhewBootstrappingKeyShare::generate(&param, &crs, 2, &p.sk, &pk, &p.sk_ks, &p.seed).unwrap()
    );

    // an i32::MIN coefficient is refused at every entry point
    let mut coeffs = p.sk.coeffs().to_vec();
    coeffs[3] = i32::MIN;
    let oversized = RlweSecretKey::from_coeffs(coeffs);
    assert!(matches!(
        RlweSecretKey::from_bytes(&oversized.to_bytes()),
        Err(FhewError::MalformedEncoding(_))
    ));
    assert!(serde_json::from_str::<RlweSecretKey>(&serde_json::to_string(&oversized).unwrap()).is_err());
    assert!(matches!(
        RlwePublicKeyShare::generate(&param, &crs, 2, &oversized, &p.seed),
        Err(FhewError::KeyParameterMismatch(_))
    ));
    assert!(matches!(
        FhewBootstrappingKeyShare::generate(&param, &crs, 2, &oversized, &pk, &p.sk_ks, &p.seed),
        Err(FhewError::KeyParameterMismatch(_))
    ));
}
