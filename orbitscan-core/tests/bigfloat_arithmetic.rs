use orbitscan_core::BigFloat;

#[test]
fn add_f64_backed_values() {
    let a = BigFloat::with_precision(1.25, 64);
    let b = BigFloat::with_precision(2.5, 64);
    assert_eq!(a.add(&b).to_f64(), 3.75);
}

#[test]
fn mixed_precision_promotes_to_the_larger() {
    let a = BigFloat::with_precision(1.0, 64);
    let b = BigFloat::with_precision(2.0, 256);
    let sum = a.add(&b);
    assert_eq!(sum.precision_bits(), 256);
    assert_eq!(sum.to_f64(), 3.0);
}

#[test]
fn arbitrary_precision_resolves_below_f64_epsilon() {
    let one = BigFloat::from_string("1", 256).unwrap();
    let tiny = BigFloat::from_string("1e-30", 256).unwrap();
    let sum = one.add(&tiny);

    // f64 cannot see the difference, the 256-bit value can.
    assert_eq!(sum.to_f64(), 1.0);
    assert!(sum > one);
    let diff = sum.sub(&one).to_f64();
    assert!((diff - 1e-30).abs() < 1e-40);
}

#[test]
fn mul_and_div_are_inverse() {
    let a = BigFloat::from_string("3.5", 128).unwrap();
    let b = BigFloat::from_string("0.25", 128).unwrap();
    assert_eq!(a.mul(&b).div(&b), a);
}

#[test]
fn from_string_rejects_garbage() {
    assert!(BigFloat::from_string("not a number", 64).is_err());
    assert!(BigFloat::from_string("not a number", 256).is_err());
}
