pub fn assert_ord<T: PartialOrd>(_: &T) {}
pub fn assert_partial_eq<T: PartialEq>(_: &T) {}
pub fn assert_same_type<T, U>(_: &T, _: &U) {}

#[allow(unused_macros)]
#[macro_export]
macro_rules! current_location {
    () => {
        format!("{}:{}", file!(), line!())
    };
}
#[allow(unused_imports)]
pub use current_location;

#[allow(unused_macros)]
#[macro_export]
macro_rules! check_lt {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        $crate::util::assert::assert_same_type(&lhs, &rhs);
        $crate::util::assert::assert_ord(&lhs);
        if lhs >= rhs {
            panic!(
                "check failed: {}: {} < {}: {:?} vs. {:?}",
                $crate::util::assert::current_location!(),
                stringify!($lhs),
                stringify!($rhs),
                lhs,
                rhs
            );
        }
    }};
}
#[allow(unused_imports)]
pub use check_lt;

#[allow(unused_macros)]
#[macro_export]
macro_rules! check_eq {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        $crate::util::assert::assert_same_type(&lhs, &rhs);
        $crate::util::assert::assert_partial_eq(&lhs);
        #[allow(clippy::float_cmp)]
        if lhs != rhs {
            panic!(
                "check failed: {}: {} == {}: {:?} vs. {:?}",
                $crate::util::assert::current_location!(),
                stringify!($lhs),
                stringify!($rhs),
                lhs,
                rhs
            );
        }
    }};
}
#[allow(unused_imports)]
pub use check_eq;

/// Like [`check_eq`], but via `almost_eq()`. Works for [`f64`] and the [`linalg`](crate::util::linalg)
/// types.
#[allow(unused_macros)]
#[macro_export]
macro_rules! check_almost_eq {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        $crate::util::assert::assert_same_type(&lhs, &rhs);
        if !$crate::util::linalg::AlmostEq::almost_eq(&lhs, &rhs) {
            panic!(
                "check failed: {}: {} ~= {}: {:?} vs. {:?}",
                $crate::util::assert::current_location!(),
                stringify!($lhs),
                stringify!($rhs),
                lhs,
                rhs
            );
        }
    }};
}
#[allow(unused_imports)]
pub use check_almost_eq;
