//! 素数工具 - 开放寻址表容量

/// 试除法判断素数，除数检查到 sqrt(n)
pub fn is_prime(num: usize) -> bool {
    if num < 2 {
        return false;
    }
    let mut i = 2usize;
    while i.saturating_mul(i) <= num {
        if num % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// 大于等于 `num` 的最小素数，溢出时返回 `None`
pub fn next_prime(num: usize) -> Option<usize> {
    (num..=usize::MAX).find(|&n| is_prime(n))
}
