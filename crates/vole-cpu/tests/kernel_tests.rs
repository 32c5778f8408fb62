// CPU kernel tests — every dtype through the registry, checked against a
// reference cross product computed in complex128

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vole_core::{Attributes, DType, Device, KernelRegistry, OpCall, OpKind, Tensor};
use vole_cpu::{register_kernels, CpuConfig};

fn registry(config: &CpuConfig) -> KernelRegistry {
    let mut reg = KernelRegistry::new();
    register_kernels(&mut reg, config).unwrap();
    reg
}

fn run(reg: &KernelRegistry, op: OpKind, inputs: &[&Tensor], attrs: Attributes) -> Tensor {
    let descs = inputs.iter().map(|t| t.desc().clone()).collect();
    let call = OpCall::prepare(op, descs, attrs).unwrap();
    reg.dispatch_call(&call, inputs).unwrap().remove(0)
}

fn random_complex(rng: &mut StdRng, n: usize, dtype: DType) -> Vec<Complex64> {
    (0..n)
        .map(|_| {
            let re = rng.gen_range(-2.0..2.0);
            let im = if dtype.is_complex() {
                rng.gen_range(-2.0..2.0)
            } else {
                0.0
            };
            Complex64::new(re, im)
        })
        .collect()
}

// Reference: vectors along the last axis of an (n, 3) buffer.
fn reference_cross(x: &[Complex64], y: &[Complex64]) -> Vec<Complex64> {
    x.chunks(3)
        .zip(y.chunks(3))
        .flat_map(|(a, b)| {
            [
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ]
        })
        .collect()
}

fn tolerance(dtype: DType) -> f64 {
    match dtype {
        DType::F16 => 5e-2,
        DType::BF16 => 2e-1,
        DType::F32 | DType::C64 => 1e-4,
        DType::F64 | DType::C128 => 1e-10,
    }
}

fn assert_close(a: &[Complex64], b: &[Complex64], tol: f64) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).norm() <= tol, "index {}: {} vs {} (tol {})", i, x, y, tol);
    }
}

#[test]
fn test_cross_matches_reference_for_every_dtype() {
    let reg = registry(&CpuConfig::default());
    let mut rng = StdRng::seed_from_u64(7);
    let n = 16;
    for dtype in DType::ALL {
        let xs = random_complex(&mut rng, n * 3, dtype);
        let ys = random_complex(&mut rng, n * 3, dtype);
        let x = Tensor::from_complex_slice(&xs, (n, 3), dtype, Device::Cpu).unwrap();
        let y = Tensor::from_complex_slice(&ys, (n, 3), dtype, Device::Cpu).unwrap();

        // Compare against the reference on the values actually stored.
        let expected = reference_cross(&x.to_complex_vec(), &y.to_complex_vec());
        let z = run(&reg, OpKind::Cross, &[&x, &y], Attributes::new().int("axis", -1));
        assert_eq!(z.dtype(), dtype);
        assert_eq!(z.dims(), &[n, 3]);
        assert_close(&z.to_complex_vec(), &expected, tolerance(dtype));
    }
}

#[test]
fn test_cross_antisymmetric_and_self_zero() {
    let reg = registry(&CpuConfig::default());
    let mut rng = StdRng::seed_from_u64(11);
    let xs = random_complex(&mut rng, 4 * 3 * 5, DType::F64);
    let ys = random_complex(&mut rng, 4 * 3 * 5, DType::F64);
    let x = Tensor::from_complex_slice(&xs, (4, 3, 5), DType::F64, Device::Cpu).unwrap();
    let y = Tensor::from_complex_slice(&ys, (4, 3, 5), DType::F64, Device::Cpu).unwrap();

    let xy = run(&reg, OpKind::Cross, &[&x, &y], Attributes::new()).to_f64_vec().unwrap();
    let yx = run(&reg, OpKind::Cross, &[&y, &x], Attributes::new()).to_f64_vec().unwrap();
    for (a, b) in xy.iter().zip(&yx) {
        assert!((a + b).abs() < 1e-12);
    }

    let xx = run(&reg, OpKind::Cross, &[&x, &x], Attributes::new()).to_f64_vec().unwrap();
    assert!(xx.iter().all(|v| v.abs() < 1e-12));
}

#[test]
fn test_parallel_threshold_does_not_change_results() {
    let serial = registry(&CpuConfig {
        parallel_threshold: usize::MAX,
    });
    let parallel = registry(&CpuConfig {
        parallel_threshold: 0,
    });
    let mut rng = StdRng::seed_from_u64(3);
    let xs = random_complex(&mut rng, 8 * 3 * 7, DType::F32);
    let ys = random_complex(&mut rng, 8 * 3 * 7, DType::F32);
    let x = Tensor::from_complex_slice(&xs, (8, 3, 7), DType::F32, Device::Cpu).unwrap();
    let y = Tensor::from_complex_slice(&ys, (8, 3, 7), DType::F32, Device::Cpu).unwrap();

    let a = run(&serial, OpKind::Cross, &[&x, &y], Attributes::new().int("axis", 1));
    let b = run(&parallel, OpKind::Cross, &[&x, &y], Attributes::new().int("axis", 1));
    assert_eq!(a.to_f64_vec().unwrap(), b.to_f64_vec().unwrap());
}

#[test]
fn test_complex_conj_and_cross() {
    let reg = registry(&CpuConfig::default());
    let i = Complex64::new(0.0, 1.0);
    let x = Tensor::from_complex_slice(
        &[i, Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        3usize,
        DType::C128,
        Device::Cpu,
    )
    .unwrap();
    let c = run(&reg, OpKind::Conj, &[&x], Attributes::new());
    assert_eq!(c.to_complex_vec()[0], -i);

    // x × conj(x) = (1*0 - 0*1, 0*(-i) - i*0, i*1 - 1*(-i)) = (0, 0, 2i)
    let z = run(&reg, OpKind::Cross, &[&x, &c], Attributes::new());
    assert_eq!(
        z.to_complex_vec(),
        vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 2.0)]
    );
}

#[test]
fn test_empty_batch() {
    let reg = registry(&CpuConfig::default());
    let x = Tensor::from_f64_slice(&[], (0, 3), DType::F16, Device::Cpu).unwrap();
    let z = run(&reg, OpKind::Cross, &[&x, &x], Attributes::new().int("axis", 1));
    assert_eq!(z.dims(), &[0, 3]);
    assert_eq!(z.elem_count(), 0);
}

#[test]
fn test_concat_then_slice_along_middle_axis() {
    let reg = registry(&CpuConfig::default());
    let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0], (2, 1, 2), DType::BF16, Device::Cpu).unwrap();
    let b = Tensor::from_f64_slice(&[5.0, 6.0, 7.0, 8.0], (2, 1, 2), DType::BF16, Device::Cpu).unwrap();
    let c = run(&reg, OpKind::Concat, &[&a, &b], Attributes::new().int("axis", 1));
    assert_eq!(c.dims(), &[2, 2, 2]);
    assert_eq!(
        c.to_f64_vec().unwrap(),
        vec![1.0, 2.0, 5.0, 6.0, 3.0, 4.0, 7.0, 8.0]
    );
    let s = run(
        &reg,
        OpKind::Slice,
        &[&c],
        Attributes::new().int("axis", 1).int("start", 1),
    );
    assert_eq!(s.to_f64_vec().unwrap(), b.to_f64_vec().unwrap());
}
