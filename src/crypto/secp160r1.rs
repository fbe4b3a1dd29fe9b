use num_bigint::BigUint;
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::LazyLock;

use super::{
    CryptoError, KeyGen, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, PrivateKey, PublicKey,
    SIGNATURE_SIZE, Signature, Signer,
};

// SEC 2 v1.0, section 2.4.2.
const P: [u8; 20] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff, 0xff,
];
const A: [u8; 20] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff, 0xfc,
];
const B: [u8; 20] = [
    0x1c, 0x97, 0xbe, 0xfc, 0x54, 0xbd, 0x7a, 0x8b, 0x65, 0xac,
    0xf8, 0x9f, 0x81, 0xd4, 0xd4, 0xad, 0xc5, 0x65, 0xfa, 0x45,
];
const GX: [u8; 20] = [
    0x4a, 0x96, 0xb5, 0x68, 0x8e, 0xf5, 0x73, 0x28, 0x46, 0x64,
    0x69, 0x89, 0x68, 0xc3, 0x8b, 0xb9, 0x13, 0xcb, 0xfc, 0x82,
];
const GY: [u8; 20] = [
    0x23, 0xa6, 0x28, 0x55, 0x31, 0x68, 0x94, 0x7d, 0x59, 0xdc,
    0xc9, 0x12, 0x04, 0x23, 0x51, 0x37, 0x7a, 0xc5, 0xfb, 0x32,
];
const N: [u8; 21] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x01, 0xf4, 0xc8, 0xf9, 0x27, 0xae, 0xd3, 0xca, 0x75, 0x22,
    0x57,
];

const COORD_SIZE: usize = 20;
const MAX_NONCE_ATTEMPTS: usize = 64;

struct Params {
    p: BigUint,
    a: BigUint,
    b: BigUint,
    n: BigUint,
    g: Point,
}

static PARAMS: LazyLock<Params> = LazyLock::new(|| Params {
    p: BigUint::from_bytes_be(&P),
    a: BigUint::from_bytes_be(&A),
    b: BigUint::from_bytes_be(&B),
    n: BigUint::from_bytes_be(&N),
    g: Point {
        x: BigUint::from_bytes_be(&GX),
        y: BigUint::from_bytes_be(&GY),
    },
});

/// Affine point; the point at infinity is `None` wherever a `Point` may vanish.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Point {
    x: BigUint,
    y: BigUint,
}

fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    ((a % m) + m - (b % m)) % m
}

/// Modular inverse through Fermat; `m` must be prime and `a` non-zero mod `m`.
fn inv_mod(a: &BigUint, m: &BigUint) -> BigUint {
    let two = BigUint::from(2u32);
    a.modpow(&(m - &two), m)
}

fn double(pt: &Point) -> Option<Point> {
    let params = &*PARAMS;
    let m = &params.p;
    if pt.y.is_zero() {
        return None;
    }
    let three = BigUint::from(3u32);
    let num = (&three * &pt.x * &pt.x + &params.a) % m;
    let den = inv_mod(&((&pt.y + &pt.y) % m), m);
    let lambda = num * den % m;
    let x = sub_mod(&(&lambda * &lambda % m), &((&pt.x + &pt.x) % m), m);
    let y = sub_mod(&(&lambda * sub_mod(&pt.x, &x, m) % m), &pt.y, m);
    Some(Point { x, y })
}

fn add(p1: Option<&Point>, p2: Option<&Point>) -> Option<Point> {
    let (p1, p2) = match (p1, p2) {
        (None, q) => return q.cloned(),
        (p, None) => return p.cloned(),
        (Some(p1), Some(p2)) => (p1, p2),
    };
    let m = &PARAMS.p;
    if p1.x == p2.x {
        if ((&p1.y + &p2.y) % m).is_zero() {
            return None;
        }
        return double(p1);
    }
    let lambda = sub_mod(&p2.y, &p1.y, m) * inv_mod(&sub_mod(&p2.x, &p1.x, m), m) % m;
    let x = sub_mod(&sub_mod(&(&lambda * &lambda % m), &p1.x, m), &p2.x, m);
    let y = sub_mod(&(&lambda * sub_mod(&p1.x, &x, m) % m), &p1.y, m);
    Some(Point { x, y })
}

fn mul(k: &BigUint, pt: &Point) -> Option<Point> {
    let mut acc: Option<Point> = None;
    for i in (0..k.bits()).rev() {
        acc = acc.as_ref().and_then(double);
        if k.bit(i) {
            acc = add(acc.as_ref(), Some(pt));
        }
    }
    acc
}

fn on_curve(pt: &Point) -> bool {
    let params = &*PARAMS;
    let m = &params.p;
    if pt.x >= *m || pt.y >= *m {
        return false;
    }
    let lhs = &pt.y * &pt.y % m;
    let rhs = (&pt.x * &pt.x * &pt.x + &params.a * &pt.x + &params.b) % m;
    lhs == rhs
}

/// Leftmost `bits(n)` bits of the message, as ECDSA prescribes.
fn message_scalar(message: &[u8]) -> BigUint {
    let e = BigUint::from_bytes_be(message);
    let len_bits = message.len() as u64 * 8;
    let n_bits = PARAMS.n.bits();
    if len_bits > n_bits {
        e >> (len_bits - n_bits) as usize
    } else {
        e
    }
}

fn to_fixed<const LEN: usize>(value: &BigUint) -> Option<[u8; LEN]> {
    let bytes = value.to_bytes_be();
    if bytes.len() > LEN {
        return None;
    }
    let mut out = [0u8; LEN];
    out[LEN - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

fn encode_point(pt: &Point) -> Option<PublicKey> {
    let x = to_fixed::<COORD_SIZE>(&pt.x)?;
    let y = to_fixed::<COORD_SIZE>(&pt.y)?;
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out[..COORD_SIZE].copy_from_slice(&x);
    out[COORD_SIZE..].copy_from_slice(&y);
    Some(PublicKey(out))
}

/// Software secp160r1 keygen and ECDSA signer.
pub struct Secp160r1 {
    rng: StdRng,
}

impl Secp160r1 {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform scalar in `[1, n)`.
    fn random_scalar(&mut self) -> BigUint {
        let n = &PARAMS.n;
        loop {
            let mut bytes = [0u8; PRIVATE_KEY_SIZE];
            self.rng.fill_bytes(&mut bytes);
            bytes[0] &= 0x01;
            let k = BigUint::from_bytes_be(&bytes);
            if !k.is_zero() && k < *n {
                return k;
            }
        }
    }
}

impl Default for Secp160r1 {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGen for Secp160r1 {
    fn generate_keypair(&mut self) -> Result<(PublicKey, PrivateKey), CryptoError> {
        let d = self.random_scalar();
        let q = mul(&d, &PARAMS.g)
            .ok_or_else(|| CryptoError::KeyGen("public point at infinity".into()))?;
        let public = encode_point(&q)
            .ok_or_else(|| CryptoError::KeyGen("public point out of range".into()))?;
        let private = to_fixed::<PRIVATE_KEY_SIZE>(&d)
            .ok_or_else(|| CryptoError::KeyGen("scalar out of range".into()))?;
        Ok((public, PrivateKey(private)))
    }
}

impl Signer for Secp160r1 {
    fn sign(&mut self, key: &PrivateKey, message: &[u8]) -> Result<Signature, CryptoError> {
        let params = &*PARAMS;
        let n = &params.n;
        let d = BigUint::from_bytes_be(&key.0);
        if d.is_zero() || d >= *n {
            return Err(CryptoError::InvalidKey);
        }
        let e = message_scalar(message);

        for _ in 0..MAX_NONCE_ATTEMPTS {
            let k = self.random_scalar();
            let Some(point) = mul(&k, &params.g) else {
                continue;
            };
            let r = &point.x % n;
            if r.is_zero() {
                continue;
            }
            let s = inv_mod(&k, n) * ((&e + &r * &d) % n) % n;
            if s.is_zero() {
                continue;
            }
            // n is one bit wider than the wire fields.
            let (Some(r_bytes), Some(s_bytes)) =
                (to_fixed::<COORD_SIZE>(&r), to_fixed::<COORD_SIZE>(&s))
            else {
                continue;
            };
            let mut sig = [0u8; SIGNATURE_SIZE];
            sig[..COORD_SIZE].copy_from_slice(&r_bytes);
            sig[COORD_SIZE..].copy_from_slice(&s_bytes);
            return Ok(Signature(sig));
        }
        Err(CryptoError::Sign("no usable nonce".into()))
    }
}

/// Check `signature` over `message` against `public`.
pub fn verify(public: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let params = &*PARAMS;
    let n = &params.n;
    let q = Point {
        x: BigUint::from_bytes_be(&public.0[..COORD_SIZE]),
        y: BigUint::from_bytes_be(&public.0[COORD_SIZE..]),
    };
    if !on_curve(&q) {
        return false;
    }
    let r = BigUint::from_bytes_be(&signature.0[..COORD_SIZE]);
    let s = BigUint::from_bytes_be(&signature.0[COORD_SIZE..]);
    if r.is_zero() || s.is_zero() || r >= *n || s >= *n {
        return false;
    }
    let e = message_scalar(message);
    let w = inv_mod(&s, n);
    let u1 = &e * &w % n;
    let u2 = &r * &w % n;
    match add(mul(&u1, &params.g).as_ref(), mul(&u2, &q).as_ref()) {
        Some(point) => &point.x % n == r,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_on_curve() {
        assert!(on_curve(&PARAMS.g));
    }

    #[test]
    fn test_generator_has_order_n() {
        assert!(mul(&PARAMS.n, &PARAMS.g).is_none());
    }

    #[test]
    fn test_sign_then_verify() {
        let mut curve = Secp160r1::from_seed(7);
        let (public, private) = curve.generate_keypair().unwrap();
        let message = [0x02u8; 20];
        let sig = curve.sign(&private, &message).unwrap();
        assert!(verify(&public, &message, &sig));
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let mut curve = Secp160r1::from_seed(8);
        let (public, private) = curve.generate_keypair().unwrap();
        let sig = curve.sign(&private, &[0x02u8; 20]).unwrap();
        assert!(!verify(&public, &[0x03u8; 20], &sig));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let mut curve = Secp160r1::from_seed(9);
        let (_, private) = curve.generate_keypair().unwrap();
        let (other_public, _) = curve.generate_keypair().unwrap();
        let sig = curve.sign(&private, &[0x02u8; 20]).unwrap();
        assert!(!verify(&other_public, &[0x02u8; 20], &sig));
    }

    #[test]
    fn test_public_key_is_on_curve() {
        let mut curve = Secp160r1::from_seed(10);
        let (public, _) = curve.generate_keypair().unwrap();
        let q = Point {
            x: BigUint::from_bytes_be(&public.0[..COORD_SIZE]),
            y: BigUint::from_bytes_be(&public.0[COORD_SIZE..]),
        };
        assert!(on_curve(&q));
    }

    #[test]
    fn test_sign_rejects_zero_key() {
        let mut curve = Secp160r1::from_seed(11);
        let res = curve.sign(&PrivateKey([0u8; PRIVATE_KEY_SIZE]), &[0u8; 20]);
        assert!(matches!(res, Err(CryptoError::InvalidKey)));
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKey([0xAB; PRIVATE_KEY_SIZE]);
        assert_eq!(format!("{key:?}"), "PrivateKey(<redacted>)");
    }
}
